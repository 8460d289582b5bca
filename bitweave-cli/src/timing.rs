//! Code for timing the phases of a run

use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use ascii_tree::{write_tree, Tree};
use cpu_time::{ProcessTime, ThreadTime};
use linked_hash_map::LinkedHashMap;
use once_cell::sync::Lazy;

/// Global instance of the [TimedCode]
static TIMECODE_INSTANCE: Lazy<Mutex<TimedCode>> = Lazy::new(|| Mutex::new(TimedCode::default()));

/// Accumulated times of a block
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Timings {
    system: Duration,
    process: Duration,
    thread: Duration,
    runs: u64,
}

impl Timings {
    /// Wall-clock time spent in the block.
    pub(crate) fn system_time(&self) -> Duration {
        self.system
    }
}

/// Start points of a running measurement
#[derive(Debug, Clone, Copy)]
struct Running {
    system: Instant,
    process: ProcessTime,
    thread: Duration,
}

/// Represents a block of code that is timed
///
/// Sub-blocks are kept in the order in which they were first entered.
#[derive(Debug, Default)]
pub(crate) struct TimedCode {
    timings: Timings,
    running: Option<Running>,
    blocks: LinkedHashMap<String, TimedCode>,
}

impl TimedCode {
    /// Return the global instance
    pub(crate) fn instance() -> MutexGuard<'static, TimedCode> {
        TIMECODE_INSTANCE
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Navigate to a subblock (use forward slash to go multiple layers at once)
    pub(crate) fn sub(&mut self, name: &str) -> &mut TimedCode {
        name.split('/').fold(self, |block, part| {
            block.blocks.entry(part.to_string()).or_default()
        })
    }

    /// Times recorded for this block
    pub(crate) fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Start the next measurement
    pub(crate) fn start(&mut self) {
        debug_assert!(self.running.is_none());

        self.running = Some(Running {
            system: Instant::now(),
            process: ProcessTime::now(),
            thread: ThreadTime::now().as_duration(),
        });
    }

    /// Stop the current measurement, add it to the totals and return its wall-clock time
    pub(crate) fn stop(&mut self) -> Duration {
        let Some(running) = self.running.take() else {
            log::warn!("Stopped a timer that was not running");
            return Duration::ZERO;
        };

        let system = running.system.elapsed();
        self.timings.system += system;
        self.timings.process += running.process.elapsed();
        self.timings.thread += ThreadTime::now()
            .as_duration()
            .saturating_sub(running.thread);
        self.timings.runs += 1;

        system
    }

    /// Run `f` as one measurement of this block
    pub(crate) fn measure<T>(name: &str, f: impl FnOnce() -> T) -> T {
        Self::instance().sub(name).start();
        let result = f();
        Self::instance().sub(name).stop();

        result
    }

    fn create_tree_recursive(node: &TimedCode, title: String) -> Tree {
        let total = node.timings.system;

        let children: Vec<Tree> = node
            .blocks
            .iter()
            .map(|(name, block)| {
                let percentage = if total.is_zero() {
                    0.0
                } else {
                    100.0 * block.timings.system.as_secs_f64() / total.as_secs_f64()
                };

                Self::create_tree_recursive(
                    block,
                    format!(
                        "{name} [{percentage:.1}%, {}ms, {}x]",
                        block.timings.system.as_millis(),
                        block.timings.runs
                    ),
                )
            })
            .collect();

        if children.is_empty() {
            Tree::Leaf(vec![title])
        } else {
            Tree::Node(title, children)
        }
    }

    /// Creates an ASCII tree and converts it to a string representation
    pub(crate) fn create_tree_string(&self, title: &str) -> Result<String, fmt::Error> {
        let tree = Self::create_tree_recursive(
            self,
            format!(
                "{title} [system/process/thread (ms): {}/{}/{}]",
                self.timings.system.as_millis(),
                self.timings.process.as_millis(),
                self.timings.thread.as_millis()
            ),
        );

        let mut output = String::new();
        write_tree(&mut output, &tree)?;

        Ok(output)
    }
}
