//! Boot-and-run helpers shared by the integration suites.

use decavm_executor::{Cpu, RunResult};

/// Canonical test geometry: 4 KiB memory, PC 0, SP at the top of memory.
pub const MEM_SIZE: usize = 4096;

/// Boot a machine with the canonical geometry and the image at address 0.
pub fn boot(image: &[u8]) -> Cpu {
    Cpu::boot(MEM_SIZE, image, 0, 0, MEM_SIZE as u32).expect("image fits in test memory")
}

/// Boot and run to the first trap.
pub fn run_to_stop(image: &[u8], max_steps: u64) -> (Cpu, RunResult) {
    let mut cpu = boot(image);
    let result = cpu.run(max_steps);
    (cpu, result)
}

/// Step exactly `n` instructions, asserting each one retires.
pub fn step_n(cpu: &mut Cpu, n: usize) {
    for i in 0..n {
        cpu.step().unwrap_or_else(|t| panic!("step {i} trapped: {t}"));
    }
}
