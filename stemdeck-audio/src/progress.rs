//! Progress reporter - republishes reference position as a simple stream
//!
//! Subscribers receive `ProgressSample`s over bounded crossbeam channels.
//! Publishing never blocks: a full subscriber drops the sample, and a
//! disconnected one is pruned.

use crate::registry::ChannelId;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// One position/duration observation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressSample {
    pub position: f64,
    pub duration: Option<f64>,
}

impl ProgressSample {
    pub fn new(position: f64, duration: Option<f64>) -> Self {
        Self { position, duration }
    }

    /// position / duration, 0 while duration is unknown
    pub fn fraction(&self) -> f64 {
        match self.duration {
            Some(d) if d > 0.0 => (self.position / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Format seconds as `mm:ss`
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Parse `mm:ss` or plain seconds
pub fn parse_clock(input: &str) -> Option<f64> {
    let input = input.trim();
    let seconds = match input.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u64 = minutes.trim().parse().ok()?;
            let seconds: f64 = seconds.trim().parse().ok()?;
            if !(0.0..60.0).contains(&seconds) {
                return None;
            }
            minutes as f64 * 60.0 + seconds
        }
        None => input.parse().ok()?,
    };
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

/// Fans reference-channel progress out to any number of subscribers
#[derive(Debug)]
pub struct ProgressReporter {
    subscribers: Vec<Sender<ProgressSample>>,
    capacity: usize,
    last: Option<ProgressSample>,
    /// Latest sample per channel, indexed by channel id
    channels: Vec<ProgressSample>,
    closed: bool,
}

impl ProgressReporter {
    pub fn new(channel_count: usize, capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            capacity: capacity.max(1),
            last: None,
            channels: vec![ProgressSample::default(); channel_count],
            closed: false,
        }
    }

    /// Open a new stream; the latest sample, if any, is replayed first
    ///
    /// After `close` the returned receiver is already disconnected.
    pub fn subscribe(&mut self) -> Receiver<ProgressSample> {
        let (tx, rx) = bounded(self.capacity);
        if self.closed {
            return rx;
        }
        if let Some(last) = self.last {
            let _ = tx.try_send(last);
        }
        self.subscribers.push(tx);
        rx
    }

    /// Publish a reference-channel observation
    pub fn publish(&mut self, sample: ProgressSample) {
        if self.closed {
            return;
        }
        self.last = Some(sample);
        self.subscribers.retain(|tx| match tx.try_send(sample) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// Record a channel's own observation
    pub fn record_channel(&mut self, id: ChannelId, sample: ProgressSample) {
        if let Some(slot) = self.channels.get_mut(id.index()) {
            *slot = sample;
        }
    }

    pub fn latest(&self) -> Option<ProgressSample> {
        self.last
    }

    pub fn channel(&self, id: ChannelId) -> Option<ProgressSample> {
        self.channels.get(id.index()).copied()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Drop every subscriber; their streams end
    pub fn close(&mut self) {
        self.closed = true;
        self.subscribers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(65.9), "01:05");
        assert_eq!(format_clock(3600.0), "60:00");
        assert_eq!(format_clock(-4.0), "00:00");
        assert_eq!(format_clock(f64::NAN), "00:00");
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("1:30"), Some(90.0));
        assert_eq!(parse_clock(" 0:05 "), Some(5.0));
        assert_eq!(parse_clock("42.5"), Some(42.5));
        assert_eq!(parse_clock("1:75"), None);
        assert_eq!(parse_clock("-3"), None);
        assert_eq!(parse_clock("abc"), None);
    }

    #[test]
    fn test_fraction() {
        assert_eq!(ProgressSample::new(30.0, Some(120.0)).fraction(), 0.25);
        assert_eq!(ProgressSample::new(30.0, None).fraction(), 0.0);
        assert_eq!(ProgressSample::new(30.0, Some(0.0)).fraction(), 0.0);
    }

    #[test]
    fn test_subscribers_receive_samples() {
        let mut reporter = ProgressReporter::new(2, 8);
        let rx = reporter.subscribe();

        reporter.publish(ProgressSample::new(1.0, Some(10.0)));
        reporter.publish(ProgressSample::new(2.0, Some(10.0)));

        let got: Vec<f64> = rx.try_iter().map(|s| s.position).collect();
        assert_eq!(got, vec![1.0, 2.0]);
    }

    #[test]
    fn test_resubscribe_replays_latest() {
        let mut reporter = ProgressReporter::new(2, 8);
        let first = reporter.subscribe();
        reporter.publish(ProgressSample::new(3.0, Some(10.0)));
        drop(first);

        let second = reporter.subscribe();
        assert_eq!(second.try_recv().unwrap().position, 3.0);

        reporter.publish(ProgressSample::new(4.0, Some(10.0)));
        assert_eq!(reporter.subscriber_count(), 1);
    }

    #[test]
    fn test_full_subscriber_does_not_block() {
        let mut reporter = ProgressReporter::new(2, 1);
        let rx = reporter.subscribe();
        for i in 0..5 {
            reporter.publish(ProgressSample::new(i as f64, None));
        }
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(reporter.latest().unwrap().position, 4.0);
    }

    #[test]
    fn test_channel_samples() {
        let mut reporter = ProgressReporter::new(2, 4);
        reporter.record_channel(ChannelId::new(1), ProgressSample::new(5.0, Some(20.0)));
        reporter.record_channel(ChannelId::new(9), ProgressSample::new(5.0, None));
        assert_eq!(reporter.channel(ChannelId::new(1)).unwrap().fraction(), 0.25);
        assert!(reporter.channel(ChannelId::new(9)).is_none());
    }

    #[test]
    fn test_close_ends_streams() {
        let mut reporter = ProgressReporter::new(2, 4);
        let rx = reporter.subscribe();
        reporter.close();
        assert!(rx.recv().is_err());
        assert!(reporter.subscribe().recv().is_err());
    }
}
