// Handlers module
pub mod chat;
pub mod stream;
pub mod lead;
pub mod health;

/// Short random id used to correlate the log lines of one request
pub fn new_trace_id() -> String {
    use rand::Rng;
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
