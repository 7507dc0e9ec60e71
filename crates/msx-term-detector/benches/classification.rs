use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use msx_term_detector::{classify, is_candidate_prefix, is_complete_prompt};

/// Fragments representative of what the stream buffer holds between prompts.
fn sample_fragments() -> Vec<(&'static str, &'static str)> {
    vec![
        ("dos_prompt", "A>"),
        ("dos_colon_prompt", "C:>"),
        ("basic_prompt", "Ok"),
        ("error_prompt", "?Redo from start"),
        ("plain_text", "LIST OF FILES ON DRIVE A"),
        (
            "command_output_with_prompt",
            "AUTOEXEC BAS    1024\r\nGAME    ROM   32768\r\nA>",
        ),
        (
            "long_listing",
            "10 PRINT \"HELLO\"\r\n20 GOTO 10\r\n30 REM LOOP FOREVER\r\n40 END\r\nOk",
        ),
    ]
}

fn bench_is_complete_prompt(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_complete_prompt");

    for (name, fragment) in sample_fragments() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &fragment, |b, f| {
            b.iter(|| is_complete_prompt(black_box(*f)));
        });
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for (name, fragment) in sample_fragments() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &fragment, |b, f| {
            b.iter(|| classify(black_box(*f)));
        });
    }

    group.finish();
}

fn bench_is_candidate_prefix(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_candidate_prefix");

    for fragment in ["A", "A:", "Re", "?Redo", "not a prompt"] {
        group.bench_with_input(
            BenchmarkId::from_parameter(fragment),
            &fragment,
            |b, f| {
                b.iter(|| is_candidate_prefix(black_box(*f)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_is_complete_prompt,
    bench_classify,
    bench_is_candidate_prefix
);
criterion_main!(benches);
