//! Benchmarks for memory growth and word-sized writes.

use alloy::primitives::U256;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use evmstate_vm::core::{advisor::MemoryGrowthAdvisor, memory::Memory, opcodes, stack::Stack};

fn bench_mstore(c: &mut Criterion) {
    let mut group = c.benchmark_group("evmstate_vm");
    let advisor = MemoryGrowthAdvisor::default();
    let word = [0xffu8; 32];

    group.sample_size(500);
    group.bench_function(BenchmarkId::from_parameter("mstore_1024_words"), |b| {
        b.iter(|| {
            let mut memory = Memory::new();
            let mut stack = Stack::new();

            for i in 0..1024usize {
                stack.push(U256::from_be_bytes(word));
                stack.push(U256::from(i * 32));

                advisor.prepare(opcodes::MSTORE, &stack, &mut memory).expect("growth failed");
                memory.write(i * 32, 32, &word).expect("write failed");

                stack.pop_n(2).expect("stack underflow");
            }

            assert_eq!(memory.length(), 1024 * 32);
            memory
        });
    });

    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("evmstate_vm");
    let mut memory = Memory::new();
    memory.resize(4096);

    group.bench_function(BenchmarkId::from_parameter("read_past_end"), |b| {
        b.iter(|| memory.read(4000, 256));
    });

    group.finish();
}

criterion_group!(benches, bench_mstore, bench_read);
criterion_main!(benches);
