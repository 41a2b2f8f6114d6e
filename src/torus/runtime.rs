//! Thread-per-unit schedule.
//!
//! Every unit owns its block on its own OS thread and talks to its neighbors
//! only through `ChannelTransport`. The calling thread is the coordinator: it
//! acts as the per-generation barrier (every unit reports, then every unit is
//! released), gathers snapshots for display, applies pacing, and turns any
//! unit failure into an abort of the whole run.
//!
//! Per generation `g`, for each unit:
//! 1. report `Ready(g)` to the coordinator, with a snapshot if one is wanted
//! 2. wait for `Go` (or `Finish` / `Abort`)
//! 3. exchange halos for `g` and run the kernel
//!
//! No unit sends generation `g + 1` halos before every unit has finished
//! receiving generation `g`, because `Go` for `g + 1` is only issued after all
//! `Ready(g + 1)` reports are in.
//!
//! The coordinator waits for reports without a deadline, so kernel time is
//! never bounded. Every path out of a unit is reported: halo waits time out on
//! their own, and a panicking unit reports through `PanicReporter` as it
//! unwinds.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use log::{debug, error, warn};

use super::block::Block;
use super::config::{Delivery, Partition};
use super::error::{TorusError, TorusResult};
use super::exchange::{self, AbortHandle, ChannelTransport};
use super::layout;
use super::render::Renderer;
use super::topology::{NeighborSet, UnitId};

enum Report {
    Ready {
        unit: UnitId,
        generation: u64,
        snapshot: Option<Block>,
    },
    Failed {
        unit: UnitId,
        error: TorusError,
    },
}

enum Command {
    Go,
    Finish,
    Abort,
}

/// Sends `Failed(UnitPanicked)` if dropped while its unit thread unwinds.
struct PanicReporter {
    unit: UnitId,
    reports: Sender<Report>,
}

impl Drop for PanicReporter {
    fn drop(&mut self) {
        if thread::panicking() {
            let unit = self.unit;
            let _ = self.reports.send(Report::Failed {
                unit,
                error: TorusError::UnitPanicked { unit },
            });
        }
    }
}

/// Parameters for one multi-generation run on unit threads.
pub(crate) struct ThreadRun<'a> {
    pub partition: &'a Partition,
    pub topology: &'a [NeighborSet],
    pub first_generation: u64,
    pub rounds: u64,
    pub delivery: Delivery,
    pub renderer: &'a dyn Renderer,
    pub frame_delay: Option<Duration>,
    pub exchange_timeout: Duration,
}

impl ThreadRun<'_> {
    /// Advance `blocks` by `rounds` generations. Returns the final blocks, or
    /// the first error if any unit failed; no partial result is returned.
    pub fn run(&self, blocks: Vec<Block>) -> TorusResult<Vec<Block>> {
        let units = blocks.len();
        debug_assert_eq!(units, self.partition.units);

        let (transports, abort) = exchange::channel_mesh(self.topology, self.exchange_timeout);
        let (report_tx, report_rx) = mpsc::channel::<Report>();

        thread::scope(|scope| {
            let mut commands = Vec::with_capacity(units);
            let mut handles = Vec::with_capacity(units);

            for (u, (block, transport)) in blocks.into_iter().zip(transports).enumerate() {
                let (command_tx, command_rx) = mpsc::channel();
                commands.push(command_tx);
                let reports = report_tx.clone();
                let unit = UnitId(u);
                handles.push(scope.spawn(move || {
                    let _reporter = PanicReporter {
                        unit,
                        reports: reports.clone(),
                    };
                    self.unit_loop(unit, block, transport, command_rx, reports)
                }));
            }
            drop(report_tx);

            let outcome = self.coordinate(&report_rx, &commands);
            if let Err(e) = &outcome {
                error!("aborting run: {e}");
                self.abort(&abort, &commands);
            }

            let mut first_error = outcome.err();
            let mut finished = Vec::with_capacity(units);
            for (u, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(Ok(block)) => finished.push(block),
                    Ok(Err(e)) => {
                        first_error.get_or_insert(e);
                    }
                    Err(_) => {
                        first_error.get_or_insert(TorusError::UnitPanicked { unit: UnitId(u) });
                    }
                }
            }

            match first_error {
                Some(e) => Err(e),
                None => Ok(finished),
            }
        })
    }

    fn abort(&self, abort: &AbortHandle, commands: &[Sender<Command>]) {
        abort.abort_all();
        for command in commands {
            // Units that already exited have dropped their receiver.
            let _ = command.send(Command::Abort);
        }
    }

    fn unit_loop(
        &self,
        unit: UnitId,
        mut block: Block,
        mut transport: ChannelTransport,
        commands: Receiver<Command>,
        reports: Sender<Report>,
    ) -> TorusResult<Block> {
        let neighbors = &self.topology[unit.index()];
        let end = self.first_generation + self.rounds;
        let mut generation = self.first_generation;

        loop {
            let displayed = generation < end;
            if displayed && self.delivery == Delivery::PerUnit {
                if let Err(e) = self.renderer.show_block(generation, unit, &block) {
                    warn!("unit {unit}: display failed: {e}");
                }
            }
            let snapshot = (displayed && self.delivery == Delivery::Gathered).then(|| block.clone());

            let ready = Report::Ready {
                unit,
                generation,
                snapshot,
            };
            if reports.send(ready).is_err() {
                return Err(TorusError::Aborted { unit });
            }

            match commands.recv() {
                Ok(Command::Go) => {}
                Ok(Command::Finish) => return Ok(block),
                Ok(Command::Abort) | Err(_) => return Err(TorusError::Aborted { unit }),
            }

            match exchange::advance(&mut transport, unit, neighbors, &block, generation) {
                Ok(next) => block = next,
                Err(error) => {
                    let _ = reports.send(Report::Failed {
                        unit,
                        error: error.clone(),
                    });
                    return Err(error);
                }
            }
            generation += 1;
        }
    }

    /// The barrier: wait for every unit's report, display, release.
    fn coordinate(
        &self,
        reports: &Receiver<Report>,
        commands: &[Sender<Command>],
    ) -> TorusResult<()> {
        let units = commands.len();
        let end = self.first_generation + self.rounds;

        for generation in self.first_generation..=end {
            let mut snapshots: Vec<Option<Block>> = vec![None; units];
            let mut reported = vec![false; units];

            for _ in 0..units {
                match reports.recv() {
                    Ok(Report::Ready {
                        unit,
                        generation: got,
                        snapshot,
                    }) => {
                        if got != generation {
                            return Err(TorusError::OutOfStep {
                                unit,
                                expected: generation,
                                got,
                            });
                        }
                        reported[unit.index()] = true;
                        snapshots[unit.index()] = snapshot;
                    }
                    Ok(Report::Failed { unit, error }) => {
                        error!("unit {unit} failed in generation {generation}: {error}");
                        return Err(error);
                    }
                    Err(_) => {
                        // Every unit exited without reporting.
                        let missing = reported.iter().position(|&r| !r).unwrap_or(0);
                        return Err(TorusError::PeerDisconnected {
                            unit: UnitId(missing),
                        });
                    }
                }
            }

            if generation == end {
                for command in commands {
                    let _ = command.send(Command::Finish);
                }
                return Ok(());
            }

            debug!("generation {generation}: all {units} units ready");
            if self.delivery == Delivery::Gathered {
                let blocks: Option<Vec<Block>> = snapshots.into_iter().collect();
                if let Some(blocks) = blocks {
                    let grid = layout::gather(&blocks, self.partition);
                    if let Err(e) = self.renderer.show_grid(generation, &grid, self.partition) {
                        warn!("display failed: {e}");
                    }
                }
            }
            if let Some(delay) = self.frame_delay {
                thread::sleep(delay);
            }

            for (u, command) in commands.iter().enumerate() {
                if command.send(Command::Go).is_err() {
                    return Err(TorusError::PeerDisconnected { unit: UnitId(u) });
                }
            }
        }
        Ok(())
    }
}
