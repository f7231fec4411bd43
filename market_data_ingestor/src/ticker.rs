/// Longest ticker accepted from user input.
pub const MAX_TICKER_LEN: usize = 20;

/// Cleans a user-supplied ticker: at most [`MAX_TICKER_LEN`] characters,
/// only ASCII alphanumerics plus `-`, `_` and `.`, uppercased.
///
/// The result may be empty; callers reject that.
pub fn sanitize_ticker(ticker: &str) -> String {
    ticker
        .chars()
        .take(MAX_TICKER_LEN)
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect::<String>()
        .to_uppercase()
}
