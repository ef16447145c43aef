use bitpacked::{Mode, Object, Range, Runtime, packers};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_packers(c: &mut Criterion) {
    let floats = [3.1415, -8.371198e+298, 4.778299e-299, 8.589973e+9, 0.0];
    c.bench_function("pack_float", |b| {
        b.iter(|| {
            for x in floats {
                black_box(packers::bits::pack_float(black_box(x)));
            }
        })
    });

    let range = Range::new(0, 600, 2).unwrap();
    c.bench_function("pack_range", |b| {
        b.iter(|| black_box(packers::bits::pack_range(black_box(&range))))
    });

    let objects = [
        Object::None,
        Object::Bool(true),
        Object::Int(12000),
        Object::Float(567.8),
        Object::Range(range),
    ];
    c.bench_function("pack_dispatch", |b| {
        b.iter(|| {
            for object in &objects {
                black_box(packers::pack(black_box(object)));
            }
        })
    });
}

fn bench_identity(c: &mut Criterion) {
    for (name, mode) in [
        ("identity_packed", Mode::packed().unwrap()),
        ("identity_conventional", Mode::conventional()),
    ] {
        let runtime = Runtime::new(mode);
        c.bench_function(name, |b| {
            b.iter(|| {
                let word = runtime.identity_of(black_box(Object::Int(12000)));
                runtime.release(word).unwrap();
            })
        });
    }
}

criterion_group!(benches, bench_packers, bench_identity);
criterion_main!(benches);
