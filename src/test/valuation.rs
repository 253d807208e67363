#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::engine::replay::replay;
    use crate::engine::valuation::{PriceMap, enrich_holdings, monthly_performance, summarize};
    use crate::models::{
        HoldingBasis, PriceSource, Quote, Transaction, TransactionType,
    };

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn transaction(
        id: i64,
        date_: NaiveDate,
        transaction_type: TransactionType,
        symbol: Option<&str>,
        quantity: Option<Decimal>,
        amount: Decimal,
    ) -> Transaction {
        Transaction::new(
            id,
            "main".to_string(),
            date_,
            transaction_type,
            symbol.map(str::to_string),
            quantity,
            amount,
            None,
        )
    }

    fn basis(symbol: &str, quantity: Decimal, average_cost: Decimal) -> HoldingBasis {
        HoldingBasis::new(
            symbol.to_string(),
            quantity,
            average_cost,
            quantity * average_cost,
            date(1, 2),
            false,
        )
    }

    fn quote(symbol: &str, price: Decimal) -> Quote {
        Quote::new(
            symbol.to_string(),
            price,
            price,
            Decimal::ZERO,
            Decimal::ZERO,
            0,
            date(6, 3),
            PriceSource::Yahoo,
        )
    }

    #[test]
    fn holdings_value_at_resolved_prices() {
        let bases = vec![basis("AAPL", dec!(10), dec!(100))];
        let mut prices = PriceMap::new();
        prices.insert("AAPL".to_string(), quote("AAPL", dec!(130)));

        let holdings = enrich_holdings(&bases, &prices);

        let holding = &holdings[0];
        assert_eq!(holding.market_value(), &dec!(1300));
        assert_eq!(holding.unrealized_gain_loss(), &dec!(300));
        assert_eq!(holding.unrealized_gain_loss_percent(), &dec!(30));
        assert_eq!(holding.price_source(), &PriceSource::Yahoo);
    }

    #[test]
    fn missing_price_falls_back_to_average_cost() {
        let bases = vec![basis("OBSCURE", dec!(10), dec!(50))];
        let prices = PriceMap::new();

        let holdings = enrich_holdings(&bases, &prices);

        let holding = &holdings[0];
        assert_eq!(holding.current_price(), &dec!(50));
        assert_eq!(holding.market_value(), &dec!(500));
        assert_eq!(holding.unrealized_gain_loss(), &Decimal::ZERO);
        assert_eq!(holding.price_source(), &PriceSource::AverageCost);
        assert!(!holding.price_source().is_market());
    }

    #[test]
    fn non_positive_price_falls_back_to_average_cost() {
        let bases = vec![basis("AAPL", dec!(10), dec!(100))];
        let mut prices = PriceMap::new();
        prices.insert("AAPL".to_string(), quote("AAPL", Decimal::ZERO));

        let holdings = enrich_holdings(&bases, &prices);

        assert_eq!(holdings[0].price_source(), &PriceSource::AverageCost);
        assert_eq!(holdings[0].current_price(), &dec!(100));
    }

    #[test]
    fn cash_balance_nets_all_flows() {
        let ledger = vec![
            transaction(1, date(1, 1), TransactionType::Deposit, None, None, dec!(1000)),
            transaction(2, date(1, 2), TransactionType::Buy, Some("AAPL"), Some(dec!(10)), dec!(-1000)),
            transaction(3, date(1, 3), TransactionType::Fee, None, None, dec!(10)),
        ];
        let outcome = replay(&ledger);
        let holdings = enrich_holdings(outcome.holdings(), &PriceMap::new());

        let summary = summarize(&outcome, &holdings);

        assert_eq!(summary.total_deposits(), &dec!(1000));
        assert_eq!(summary.total_invested(), &dec!(1000));
        assert_eq!(summary.cash_balance(), &dec!(-10));
    }

    #[test]
    fn completed_trades_flow_back_into_cash() {
        let ledger = vec![
            transaction(1, date(1, 1), TransactionType::Deposit, None, None, dec!(1000)),
            transaction(2, date(1, 2), TransactionType::Buy, Some("KO"), Some(dec!(10)), dec!(-500)),
            transaction(3, date(2, 1), TransactionType::Sell, Some("KO"), Some(dec!(10)), dec!(550)),
        ];
        let outcome = replay(&ledger);
        let holdings = enrich_holdings(outcome.holdings(), &PriceMap::new());

        let summary = summarize(&outcome, &holdings);

        // 1000 - 0 open + 550 returns - 500 cost.
        assert_eq!(summary.cash_balance(), &dec!(1050));
        assert_eq!(summary.realized_gain_loss(), &dec!(50));
        assert_eq!(summary.number_of_holdings(), &0usize);
    }

    #[test]
    fn return_percentage_measured_against_contributed_capital() {
        let ledger = vec![
            transaction(1, date(1, 1), TransactionType::Deposit, None, None, dec!(1000)),
            transaction(2, date(1, 2), TransactionType::Buy, Some("KO"), Some(dec!(10)), dec!(-500)),
            transaction(3, date(2, 1), TransactionType::Sell, Some("KO"), Some(dec!(10)), dec!(600)),
        ];
        let outcome = replay(&ledger);
        let holdings = enrich_holdings(outcome.holdings(), &PriceMap::new());

        let summary = summarize(&outcome, &holdings);

        // 100 gain on 1000 contributed.
        assert_eq!(summary.return_percentage(), &dec!(10));
    }

    #[test]
    fn zero_contributed_capital_reports_zero_return() {
        let outcome = replay(&[]);
        let summary = summarize(&outcome, &[]);

        assert_eq!(summary.return_percentage(), &Decimal::ZERO);
        assert_eq!(summary.cash_balance(), &Decimal::ZERO);
    }

    #[test]
    fn monthly_performance_groups_by_calendar_month() {
        let ledger = vec![
            transaction(1, date(1, 1), TransactionType::Deposit, None, None, dec!(1000)),
            transaction(2, date(1, 15), TransactionType::Buy, Some("KO"), Some(dec!(10)), dec!(-500)),
            transaction(3, date(2, 3), TransactionType::Sell, Some("KO"), Some(dec!(5)), dec!(300)),
            transaction(4, date(2, 10), TransactionType::Dividend, Some("KO"), None, dec!(8)),
            transaction(5, date(2, 10), TransactionType::Fee, None, None, dec!(2)),
        ];

        let months = monthly_performance(&ledger);

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month(), "2024-01");
        assert_eq!(months[0].deposits(), &dec!(1000));
        assert_eq!(months[0].invested(), &dec!(500));
        assert_eq!(months[1].month(), "2024-02");
        assert_eq!(months[1].returns(), &dec!(300));
        assert_eq!(months[1].dividends(), &dec!(8));
        assert_eq!(months[1].fees(), &dec!(2));
    }
}
