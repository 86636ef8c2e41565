use std::future::Future;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Fixed-period tick loop owned by one host.
///
/// Every `start` opens a new generation and every `stop` closes the current
/// one. A loop only keeps ticking while its generation is current, so stopping
/// never interrupts a tick that is already running; the loop simply exits
/// before the next one.
#[derive(Debug, Default)]
pub struct TickDriver {
  generation: Arc<AtomicU64>,
}

impl TickDriver {
  pub fn new() -> Self {
    Self::default()
  }

  /// Spawns the loop. `on_tick` receives the generation it runs under and
  /// returns `ControlFlow::Break` to end the loop on its own. Starting again
  /// replaces any loop that is still running.
  pub fn start<F, Fut>(&self, period: Duration, delay: Duration, mut on_tick: F) -> u64
  where
    F: FnMut(u64) -> Fut + Send + 'static,
    Fut: Future<Output = ControlFlow<()>> + Send + 'static,
  {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let current = Arc::clone(&self.generation);
    tokio::spawn(async move {
      if !delay.is_zero() {
        tokio::time::sleep(delay).await;
      }
      let mut interval = tokio::time::interval(period);
      interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
      loop {
        interval.tick().await;
        if current.load(Ordering::SeqCst) != generation {
          break;
        }
        if on_tick(generation).await.is_break() {
          break;
        }
      }
      tracing::debug!(generation, "tick loop exited");
    });
    generation
  }

  /// Idempotent. Safe on a driver that never started.
  pub fn stop(&self) {
    self.generation.fetch_add(1, Ordering::SeqCst);
  }

  pub fn is_current(&self, generation: u64) -> bool {
    self.generation.load(Ordering::SeqCst) == generation
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize;

  fn counting(counter: &Arc<AtomicUsize>, limit: usize) -> impl FnMut(u64) -> std::future::Ready<ControlFlow<()>> {
    let counter = Arc::clone(counter);
    move |_| {
      let seen = counter.fetch_add(1, Ordering::SeqCst) + 1;
      std::future::ready(if seen >= limit {
        ControlFlow::Break(())
      } else {
        ControlFlow::Continue(())
      })
    }
  }

  #[tokio::test]
  async fn runs_until_callback_breaks() {
    let driver = TickDriver::new();
    let counter = Arc::new(AtomicUsize::new(0));
    driver.start(Duration::from_millis(2), Duration::ZERO, counting(&counter, 3));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn stop_halts_ticking_and_is_idempotent() {
    let driver = TickDriver::new();
    driver.stop();
    driver.stop();

    let counter = Arc::new(AtomicUsize::new(0));
    let generation = driver.start(
      Duration::from_millis(2),
      Duration::ZERO,
      counting(&counter, usize::MAX),
    );
    assert!(driver.is_current(generation));
    tokio::time::sleep(Duration::from_millis(30)).await;

    driver.stop();
    driver.stop();
    assert!(!driver.is_current(generation));
    let stopped_at = counter.load(Ordering::SeqCst);
    assert!(stopped_at > 0);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(counter.load(Ordering::SeqCst), stopped_at);
  }

  #[tokio::test]
  async fn restart_replaces_previous_loop() {
    let driver = TickDriver::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    driver.start(Duration::from_millis(2), Duration::ZERO, counting(&first, usize::MAX));
    tokio::time::sleep(Duration::from_millis(20)).await;
    driver.start(Duration::from_millis(2), Duration::ZERO, counting(&second, usize::MAX));
    let first_total = first.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(first.load(Ordering::SeqCst), first_total);
    assert!(second.load(Ordering::SeqCst) > 0);
    driver.stop();
  }

  #[tokio::test]
  async fn start_delay_postpones_first_tick() {
    let driver = TickDriver::new();
    let counter = Arc::new(AtomicUsize::new(0));
    driver.start(
      Duration::from_millis(2),
      Duration::from_millis(60),
      counting(&counter, usize::MAX),
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(counter.load(Ordering::SeqCst) > 0);
    driver.stop();
  }
}
