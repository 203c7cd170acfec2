pub mod wallet_http;
