/// Windows of the simple moving averages drawn over the price candles.
pub const PRICE_MA_WINDOWS: [usize; 4] = [12, 26, 50, 200];

/// Rolling simple mean over `window` values.
///
/// Entries before the window fills are `None`, as is every entry when
/// `window` is zero. A window holding a NaN or infinite value is `None` too;
/// later windows are unaffected once that value drops out.
pub fn sma_series(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if window == 0 {
        out.resize(values.len(), None);
        return out;
    }
    // finite values only, so one bad close cannot poison the running sum
    let mut sum = 0.0;
    let mut non_finite = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            sum += v;
        } else {
            non_finite += 1;
        }
        if i >= window {
            let old = values[i - window];
            if old.is_finite() {
                sum -= old;
            } else {
                non_finite -= 1;
            }
        }
        if i + 1 >= window && non_finite == 0 {
            out.push(Some(sum / window as f64));
        } else {
            out.push(None);
        }
    }
    out
}
