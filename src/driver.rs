//! Dedicated thread running the scheduler at a fixed interval.
use std::thread::{self, JoinHandle};
use std::time::Duration;

use smol::channel::{self, Receiver, Sender};
use smol::stream::StreamExt;
use smol::Timer;

use crate::scheduler::Scheduler;
use crate::Error;

/// Runs [`Scheduler::tick`] periodically on its own thread.
///
/// Stopping the driver lets the in-flight tick finish, then hands the scheduler back. Dropping a
/// running driver stops it as well.
pub struct Driver {
    stop: Sender<()>,
    handle: Option<JoinHandle<Scheduler>>,
}

impl Driver {
    /// Move the scheduler onto a new thread, ticking it every `interval`.
    pub fn spawn(scheduler: Scheduler, interval: Duration) -> Result<Self, Error> {
        if interval.is_zero() {
            return Err(Error::Config("tick interval cannot be zero".into()));
        }
        let (stop, stopped) = channel::bounded(1);
        let handle = thread::Builder::new()
            .name("eqscope-scheduler".into())
            .spawn(move || run(scheduler, interval, stopped))?;
        log::info!("Scheduler started, ticking every {interval:?}");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop ticking and wait for the scheduler thread to finish. No tick runs after this returns.
    pub fn stop(mut self) -> Result<Scheduler, Error> {
        self.shutdown().ok_or(Error::DriverPanicked)
    }

    fn shutdown(&mut self) -> Option<Scheduler> {
        let handle = self.handle.take()?;
        // Full or closed channels both mean the thread is already on its way out
        let _ = self.stop.try_send(());
        let scheduler = handle.join().ok();
        log::info!("Scheduler stopped");
        scheduler
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(mut scheduler: Scheduler, interval: Duration, stopped: Receiver<()>) -> Scheduler {
    smol::block_on(async {
        let mut timer = Timer::interval(interval);
        loop {
            let stop = async {
                let _ = stopped.recv().await;
                false
            };
            let tick = async { timer.next().await.is_some() };
            if !smol::future::or(stop, tick).await {
                break;
            }
            scheduler.tick();
        }
    });
    scheduler
}
