pub mod api;
pub mod db;
pub mod engine;
pub mod models;
pub mod services;

#[cfg(test)]
mod test;
