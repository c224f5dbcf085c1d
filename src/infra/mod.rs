pub mod http_client;
pub mod sleeper;

pub use http_client::ReqwestHttp;
pub use sleeper::ThreadSleeper;
