// utils/metrics.rs - Rolling timings for extraction and autoplay
const WINDOW_SIZE: usize = 60;

pub struct Metrics {
    seek_times: Vec<f64>,
    frame_times: Vec<f64>,
    seeks: usize,
    window_size: usize,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            seek_times: Vec::new(),
            frame_times: Vec::new(),
            seeks: 0,
            window_size: WINDOW_SIZE,
        }
    }

    /// Milliseconds between issuing a seek and holding its snapshot.
    pub fn record_seek_time(&mut self, time: f64) {
        self.seeks += 1;
        push_windowed(&mut self.seek_times, time, self.window_size);
    }

    /// Milliseconds between two autoplay ticks.
    pub fn record_frame_time(&mut self, time: f64) {
        push_windowed(&mut self.frame_times, time, self.window_size);
    }

    pub fn seeks(&self) -> usize {
        self.seeks
    }

    pub fn get_average_seek_ms(&self) -> f64 {
        average(&self.seek_times)
    }

    pub fn get_average_fps(&self) -> f64 {
        let frame_ms = average(&self.frame_times);
        if frame_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / frame_ms
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn push_windowed(samples: &mut Vec<f64>, value: f64, window: usize) {
    samples.push(value);
    if samples.len() > window {
        samples.remove(0);
    }
}

fn average(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_metrics_are_zero() {
        let metrics = Metrics::new();
        assert_eq!(metrics.get_average_seek_ms(), 0.0);
        assert_eq!(metrics.get_average_fps(), 0.0);
        assert_eq!(metrics.seeks(), 0);
    }

    #[test]
    fn averages_use_a_rolling_window() {
        let mut metrics = Metrics::new();
        for _ in 0..WINDOW_SIZE {
            metrics.record_seek_time(100.0);
        }
        for _ in 0..WINDOW_SIZE {
            metrics.record_seek_time(10.0);
        }
        assert_eq!(metrics.get_average_seek_ms(), 10.0);
        assert_eq!(metrics.seeks(), 2 * WINDOW_SIZE);
    }

    #[test]
    fn fps_from_frame_times() {
        let mut metrics = Metrics::new();
        metrics.record_frame_time(20.0);
        metrics.record_frame_time(20.0);
        assert_eq!(metrics.get_average_fps(), 50.0);
    }
}
