// Bag-of-cells and reconciliation benchmarks.
//
// Covers envelope decoding, message re-encoding and hashing, and a full
// match over a five-transaction window.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use omniswap_protocol::address::Address;
use omniswap_protocol::cell::{decode_base64, serialize, serialize_base64, Cell, CellBuilder};
use omniswap_protocol::ledger::memory::synthetic_record;
use omniswap_protocol::message::Message;
use omniswap_protocol::reconcile::find_match;

fn owner() -> Address {
    Address::new(0, [0x5A; 32])
}

fn envelope(seqno: u32) -> Message {
    let mut body = CellBuilder::new();
    body.store_bytes(&[seqno as u8; 64]).unwrap();
    body.store_uint(seqno as u64, 32).unwrap();
    body.store_uint(1_700_000_600, 32).unwrap();
    Message::external_in(owner(), body.build().unwrap())
}

/// A chain of `depth` full cells, each referencing the next.
fn deep_tree(depth: usize) -> Cell {
    let mut current: Option<Arc<Cell>> = None;
    for i in 0..depth {
        let mut b = CellBuilder::new();
        b.store_bytes(&[i as u8; 127]).unwrap();
        if let Some(child) = current.take() {
            b.store_ref(child).unwrap();
        }
        current = Some(Arc::new(b.build().unwrap()));
    }
    current.map(|c| (*c).clone()).unwrap_or_default()
}

fn bench_decode_envelope(c: &mut Criterion) {
    let encoded = serialize_base64(&envelope(1).to_cell().unwrap());

    c.bench_function("boc/decode_envelope", |b| {
        b.iter(|| decode_base64(&encoded).unwrap());
    });
}

fn bench_message_rehash(c: &mut Criterion) {
    let cell = envelope(2).to_cell().unwrap();

    c.bench_function("message/decode_and_rehash", |b| {
        b.iter(|| Message::from_cell(&cell).unwrap().hash().unwrap());
    });
}

fn bench_serialize_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("boc/serialize_chain");
    for depth in [1usize, 16, 128] {
        let root = deep_tree(depth);
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &root, |b, root| {
            b.iter(|| serialize(root, true));
        });
    }
    group.finish();
}

fn bench_find_match(c: &mut Criterion) {
    let target = envelope(5);
    let window: Vec<_> = (1..=5)
        .map(|seqno| {
            synthetic_record(&owner(), seqno as u64, Some(envelope(seqno).to_cell().unwrap()))
                .unwrap()
        })
        .collect();
    let target_hash = target.hash().unwrap();

    c.bench_function("reconcile/find_match_window_5", |b| {
        b.iter(|| find_match(&target_hash, &window));
    });
}

criterion_group!(
    benches,
    bench_decode_envelope,
    bench_message_rehash,
    bench_serialize_tree,
    bench_find_match
);
criterion_main!(benches);
