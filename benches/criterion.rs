// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use ecma_core::{GcSeverity, Heap, ObjectIndex, ObjectType, StringIndex, Value};

/// An object with `count` short-named properties and the names used.
fn object_with_properties(heap: &mut Heap, count: usize) -> (ObjectIndex, Vec<StringIndex>) {
    let object = heap.create_object(None, true, ObjectType::General);
    let names = (0..count)
        .map(|i| {
            let name = heap.new_string(&format!("p{i}"));
            heap.create_named_data_property(object, name, Value::NULL, true, true, true);
            name
        })
        .collect();
    (object, names)
}

fn bench_property_lookup(c: &mut Criterion) {
    let mut heap = Heap::default();
    let (object, names) = object_with_properties(&mut heap, 32);
    let name = names[0];
    c.bench_function("find_named_property (cached)", |b| {
        b.iter(|| black_box(heap.find_named_property(object, name)))
    });

    let mut heap = Heap::default();
    let object = heap.create_object(None, true, ObjectType::General);
    let long_names = (0..32)
        .map(|i| {
            let name = heap.new_string(&format!("a property name stored in chunks {i}"));
            heap.create_named_data_property(object, name, Value::NULL, true, true, true);
            name
        })
        .collect::<Vec<_>>();
    let first_added = long_names[0];
    c.bench_function("find_named_property (list scan)", |b| {
        b.iter(|| black_box(heap.find_named_property(object, first_added)))
    });
}

fn bench_strings(c: &mut Criterion) {
    c.bench_function("concat and materialize", |b| {
        b.iter_batched(
            Heap::default,
            |mut heap| {
                let mut string = heap.new_string("");
                for i in 0..64 {
                    let piece = heap.new_string_from_number(f64::from(i));
                    let next = heap.concat_strings(string, piece);
                    heap.deref_string(string);
                    heap.deref_string(piece);
                    string = next;
                }
                black_box(heap.string_to_std(string));
                heap.deref_string(string);
            },
            BatchSize::PerIteration,
        )
    });
}

fn bench_garbage_collection(c: &mut Criterion) {
    c.bench_function("collect unreachable chain", |b| {
        b.iter_batched(
            || {
                let mut heap = Heap::default();
                let name = heap.new_string("next");
                let mut previous = heap.create_object(None, true, ObjectType::General);
                for _ in 0..1_000 {
                    let object = heap.create_object(None, true, ObjectType::General);
                    heap.create_named_data_property(
                        previous,
                        name,
                        Value::Object(object),
                        true,
                        true,
                        true,
                    );
                    heap.deref_object(previous);
                    previous = object;
                }
                heap.deref_object(previous);
                heap.deref_string(name);
                heap
            },
            |mut heap| heap.try_give_memory_back(GcSeverity::Critical),
            BatchSize::PerIteration,
        )
    });
}

fn bench_stack(c: &mut Criterion) {
    let mut heap = Heap::default();
    heap.add_frame(4);
    c.bench_function("push and pop across chunks", |b| {
        b.iter(|| {
            for i in 0..100 {
                heap.push_value(Value::from(i % 2 == 0));
            }
            heap.pop_values(100);
        })
    });
    heap.free_frame();
}

criterion_group!(
    benches,
    bench_property_lookup,
    bench_strings,
    bench_garbage_collection,
    bench_stack
);
criterion_main!(benches);
