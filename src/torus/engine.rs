//! The orchestrator: owns the blocks and sequences generations.

use log::{debug, info, warn};

use super::block::Block;
use super::config::{Delivery, Partition, Schedule, TorusConfig};
use super::error::{TorusError, TorusResult};
use super::grid::Grid;
use super::layout;
use super::render::{NullRenderer, Renderer};
use super::runtime::ThreadRun;
use super::sync;
use super::topology::{NeighborSet, UnitId, neighbor_table};

pub struct TorusLife {
    config: TorusConfig,
    partition: Partition,
    topology: Vec<NeighborSet>,
    /// One block per unit, indexed by `UnitId`.
    blocks: Vec<Block>,
    generation: u64,
    pool: rayon::ThreadPool,
}

impl TorusLife {
    /// Validate `config` against `grid` and distribute the grid over the units.
    /// The grid's side overrides `config.side`.
    pub fn new(grid: Grid, config: TorusConfig) -> TorusResult<Self> {
        let config = config.side(grid.side());
        let partition = config.validate()?;

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = config.thread_count {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| TorusError::ThreadPool(e.to_string()))?;

        info!(
            "{}x{} grid on {} units ({}x{} torus of {}x{} blocks), {:?} schedule",
            partition.side,
            partition.side,
            partition.units,
            partition.per_side,
            partition.per_side,
            partition.edge,
            partition.edge,
            config.schedule
        );

        Ok(Self {
            blocks: layout::scatter(&grid, &partition),
            topology: neighbor_table(partition.units),
            config,
            partition,
            generation: 0,
            pool,
        })
    }

    #[inline]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    #[inline]
    pub fn config(&self) -> &TorusConfig {
        &self.config
    }

    /// Generations computed so far.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn block(&self, unit: UnitId) -> &Block {
        &self.blocks[unit.index()]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn neighbors(&self, unit: UnitId) -> &NeighborSet {
        &self.topology[unit.index()]
    }

    /// Reassemble the current global grid.
    pub fn grid(&self) -> Grid {
        layout::gather(&self.blocks, &self.partition)
    }

    pub fn population(&self) -> u64 {
        self.blocks.iter().map(Block::population).sum()
    }

    pub fn step(&mut self) -> TorusResult<()> {
        self.step_n(1)
    }

    /// Advance `n` generations without displaying anything.
    pub fn step_n(&mut self, n: u64) -> TorusResult<()> {
        self.advance(n, &NullRenderer, Delivery::Silent)
    }

    /// Drive `config.generations` rounds, showing generation `g` to
    /// `renderer` (as configured by `config.delivery`) before computing it.
    pub fn run(&mut self, renderer: &dyn Renderer) -> TorusResult<()> {
        self.advance(self.config.generations, renderer, self.config.delivery)
    }

    fn advance(
        &mut self,
        rounds: u64,
        renderer: &dyn Renderer,
        delivery: Delivery,
    ) -> TorusResult<()> {
        if rounds == 0 {
            return Ok(());
        }
        debug!(
            "advancing {rounds} generations from generation {}",
            self.generation
        );
        match self.config.schedule {
            Schedule::Threads => {
                let run = ThreadRun {
                    partition: &self.partition,
                    topology: &self.topology,
                    first_generation: self.generation,
                    rounds,
                    delivery,
                    renderer,
                    frame_delay: self.paced(delivery),
                    exchange_timeout: self.config.exchange_timeout,
                };
                // On failure the engine keeps the blocks it had before the run.
                self.blocks = run.run(self.blocks.clone())?;
                self.generation += rounds;
            }
            Schedule::Pool => {
                for _ in 0..rounds {
                    self.display(renderer, delivery);
                    if let Some(delay) = self.paced(delivery) {
                        std::thread::sleep(delay);
                    }
                    let (blocks, topology) = (&self.blocks, &self.topology);
                    self.blocks = self.pool.install(|| sync::step_blocks(blocks, topology))?;
                    self.generation += 1;
                }
            }
        }
        Ok(())
    }

    /// Frame delay applies only when something is being shown.
    fn paced(&self, delivery: Delivery) -> Option<std::time::Duration> {
        match delivery {
            Delivery::Silent => None,
            _ => self.config.frame_delay,
        }
    }

    fn display(&self, renderer: &dyn Renderer, delivery: Delivery) {
        let result = match delivery {
            Delivery::Silent => Ok(()),
            Delivery::Gathered => renderer.show_grid(self.generation, &self.grid(), &self.partition),
            Delivery::PerUnit => self
                .blocks
                .iter()
                .enumerate()
                .try_for_each(|(u, block)| renderer.show_block(self.generation, UnitId(u), block)),
        };
        if let Err(e) = result {
            warn!("display failed at generation {}: {e}", self.generation);
        }
    }
}
