//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and bug reports only work if a session can be reproduced from
//! its layout and input script alone. Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`fixit_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   We always iterate in sorted entity ID order.
//!
//! - **System randomness**: The core has none; input comes from the host.

use std::thread;

use fixit_core::prelude::*;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick, given the tick index
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Input for tick `tick` of a looping script; idle when the script is empty.
fn scripted_input(script: &[FrameInput], tick: u64) -> FrameInput {
    if script.is_empty() {
        return FrameInput::idle();
    }
    let index = usize::try_from(tick).unwrap_or(usize::MAX) % script.len();
    script[index].clone()
}

/// Run a session twice with the same input script and compare final hashes.
///
/// The script is replayed in a loop, one entry per tick.
pub fn verify_simulation_determinism<F>(
    setup_fn: F,
    script: &[FrameInput],
    dt: Fixed,
    num_ticks: u64,
) -> DeterminismResult
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim, tick| {
            sim.tick(dt, &scripted_input(script, tick));
        },
        Simulation::state_hash,
    )
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run N idle sessions on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(
    setup_fn: F,
    num_sims: usize,
    dt: Fixed,
    num_ticks: u64,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick(dt, &FrameInput::idle());
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match throughout, `Some(tick)` if they diverge
/// at that tick (0 means the initial states already differ).
pub fn find_first_divergence<F>(
    setup_fn: F,
    script: &[FrameInput],
    dt: Fixed,
    num_ticks: u64,
) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        let input = scripted_input(script, tick - 1);
        sim1.tick(dt, &input);
        sim2.tick(dt, &input);

        if sim1.state_hash() != sim2.state_hash() {
            tracing::warn!(tick, "Simulations diverged");
            return Some(tick);
        }
    }

    None
}

/// Proptest strategies for simulation inputs.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use fixit_core::prelude::*;
    use proptest::prelude::*;

    /// Generate a fixed-point coordinate on a small factory floor.
    ///
    /// Range: -10 to 10 in quarter steps.
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        (-40i32..=40i32).prop_map(|quarters| Fixed::from_num(quarters) / Fixed::from_num(4))
    }

    /// Generate a point on the factory floor.
    pub fn arb_ground_point() -> impl Strategy<Value = Vec3Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, z)| Vec3Fixed::ground(x, z))
    }

    /// Generate a non-negative repair amount.
    ///
    /// Range: 0 to 150 in tenths.
    pub fn arb_repair_amount() -> impl Strategy<Value = Fixed> {
        (0i32..=1500i32).prop_map(|tenths| Fixed::from_num(tenths) / Fixed::from_num(10))
    }

    /// Generate an entity reference with small IDs, some of them unknown.
    pub fn arb_entity_ref(
        max_characters: u32,
        max_machines: u32,
    ) -> impl Strategy<Value = EntityRef> {
        prop_oneof![
            (1..=max_characters + 1).prop_map(|id| EntityRef::Character(CharacterId(id))),
            (1..=max_machines + 1).prop_map(|id| EntityRef::Machine(MachineId(id))),
        ]
    }

    /// Generate one tick of pointer input.
    pub fn arb_frame_input(
        max_characters: u32,
        max_machines: u32,
    ) -> impl Strategy<Value = FrameInput> {
        (
            prop::collection::vec(arb_entity_ref(max_characters, max_machines), 0..3),
            any::<bool>(),
        )
            .prop_map(|(hits, primary_click)| FrameInput {
                hits,
                primary_click,
            })
    }

    /// Generate an input script of up to `max_len` ticks.
    pub fn arb_script(
        max_characters: u32,
        max_machines: u32,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<FrameInput>> {
        prop::collection::vec(arb_frame_input(max_characters, max_machines), 1..max_len)
    }
}
