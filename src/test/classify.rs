#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::engine::classify::{Classifier, LedgerRow, notes_price};
    use crate::models::TransactionType;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn explicit_tag_overrides_label_inference() {
        let classifier = Classifier::new();
        // Label looks like a ticker, but the tag says otherwise.
        let row = LedgerRow::new(
            date(),
            Some("Dividend".to_string()),
            "KO".to_string(),
            None,
            dec!(18.40),
            None,
        );

        let transaction = classifier.classify("main", 1, &row).unwrap();
        assert_eq!(
            transaction.transaction_type(),
            &TransactionType::Dividend
        );
        assert_eq!(transaction.symbol(), &None);
    }

    #[test]
    fn label_keywords_map_to_cash_types() {
        let classifier = Classifier::new();
        let cases = [
            ("Monthly deposit", TransactionType::Deposit),
            ("AAPL dividend payment", TransactionType::Dividend),
            ("Withholding tax", TransactionType::TaxCharge),
            ("Tax credit 2023", TransactionType::TaxCredit),
            ("Tax refund", TransactionType::TaxCredit),
            ("Brokerage fee", TransactionType::Fee),
            ("Trade commission", TransactionType::Fee),
        ];

        for (label, expected) in cases {
            let row = LedgerRow::new(date(), None, label.to_string(), None, dec!(10), None);
            let transaction = classifier.classify("main", 1, &row).unwrap();
            assert_eq!(transaction.transaction_type(), &expected, "label '{}'", label);
        }
    }

    #[test]
    fn ticker_label_with_negative_amount_is_buy() {
        let classifier = Classifier::new();
        let row = LedgerRow::new(
            date(),
            None,
            "AAPL".to_string(),
            Some(dec!(10)),
            dec!(-1850.00),
            None,
        );

        let transaction = classifier.classify("main", 1, &row).unwrap();
        assert_eq!(transaction.transaction_type(), &TransactionType::Buy);
        assert_eq!(transaction.symbol(), &Some("AAPL".to_string()));
    }

    #[test]
    fn ticker_label_with_positive_amount_is_sell() {
        let classifier = Classifier::new();
        let row = LedgerRow::new(
            date(),
            None,
            "BRK.B".to_string(),
            Some(dec!(5)),
            dec!(2100.00),
            None,
        );

        let transaction = classifier.classify("main", 1, &row).unwrap();
        assert_eq!(transaction.transaction_type(), &TransactionType::Sell);
        assert_eq!(transaction.symbol(), &Some("BRK.B".to_string()));
    }

    #[test]
    fn dividend_keyword_beats_positive_amount() {
        let classifier = Classifier::new();
        // Positive amount alone must not turn this into a Sell.
        let row = LedgerRow::new(
            date(),
            None,
            "Dividend MSFT".to_string(),
            None,
            dec!(42.50),
            None,
        );

        let transaction = classifier.classify("main", 1, &row).unwrap();
        assert_eq!(
            transaction.transaction_type(),
            &TransactionType::Dividend
        );
    }

    #[test]
    fn unrecognizable_label_is_an_error() {
        let classifier = Classifier::new();
        let row = LedgerRow::new(
            date(),
            None,
            "something entirely different".to_string(),
            None,
            dec!(50),
            None,
        );

        assert!(classifier.classify("main", 1, &row).is_err());
    }

    #[test]
    fn notes_price_parses_currency_formats() {
        assert_eq!(notes_price("Price: $1,234.50"), Some(dec!(1234.50)));
        assert_eq!(notes_price("Qty: 10, Price: 99.95"), Some(dec!(99.95)));
        assert_eq!(notes_price("Price: $850"), Some(dec!(850)));
        assert_eq!(notes_price("no price here"), None);
    }
}
