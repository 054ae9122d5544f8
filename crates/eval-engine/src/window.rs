use eval_core::{EvalError, TimeSeries, TimeSlice};

/// One (train, test) pair produced by the splitter. Consumed immediately by
/// the strategy; not retained across iterations.
#[derive(Debug, Clone, Copy)]
pub struct WindowPair<'a> {
    pub train: TimeSlice<'a>,
    pub test: TimeSlice<'a>,
}

/// Partitions an ordered series into successive (train, test) window pairs.
///
/// The i-th pair trains on `[i*H, i*H + W)` and tests on the immediately
/// following `[i*H + W, i*H + W + H)` where `W` is the window size and `H`
/// the forecast horizon (also the step size). Iteration stops as soon as a
/// test slice would run past the end of the series; a partial trailing
/// window is dropped, never padded. `W + H > N` yields zero pairs.
pub struct WalkForwardSplitter<'a> {
    series: &'a TimeSeries,
    window_size: usize,
    forecast_horizon: usize,
    cursor: usize,
}

impl<'a> WalkForwardSplitter<'a> {
    pub fn new(
        series: &'a TimeSeries,
        window_size: usize,
        forecast_horizon: usize,
    ) -> Result<Self, EvalError> {
        if window_size < 1 {
            return Err(EvalError::InvalidConfiguration(
                "window_size must be >= 1".to_string(),
            ));
        }
        if forecast_horizon < 1 {
            return Err(EvalError::InvalidConfiguration(
                "forecast_horizon must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            series,
            window_size,
            forecast_horizon,
            cursor: 0,
        })
    }
}

impl<'a> Iterator for WalkForwardSplitter<'a> {
    type Item = WindowPair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let train_start = self.cursor * self.forecast_horizon;
        let train_end = train_start + self.window_size;
        let test_end = train_end + self.forecast_horizon;

        if test_end > self.series.len() {
            return None;
        }

        self.cursor += 1;
        Some(WindowPair {
            train: self.series.slice(train_start..train_end),
            test: self.series.slice(train_end..test_end),
        })
    }
}
