//! Benchmarks for artifact loading and the converters.
//!
//! Run with: `cargo bench`

use std::hint::black_box;

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use slack_snatch::export::markup::{parse, MentionResolver};
use slack_snatch::export::{export_to_string, ExportFormat, ExportOptions};
use slack_snatch::model::{Archive, ArchiveMetadata, Channel, Message};
use slack_snatch::reader::{message_rows, search_messages};

/// A channel with `message_count` messages, every fifth one threaded.
fn generate_archive(message_count: usize) -> Archive {
    let users = ["U1", "U2", "U3", "U4"];
    let names = ["Alice", "Bob", "Carol", "Dave"];
    let base = 1_709_283_600i64;

    let messages = (0..message_count)
        .map(|i| {
            let user = i % users.len();
            let ts = format!("{}.{:06}", base + i as i64 * 60, i % 1_000_000);
            let mut msg = Message::new(
                users[user],
                format!(
                    "Message {i} for <@{}> with *bold* and <https://example.com/{i}|a link> &amp; more",
                    users[(user + 1) % users.len()]
                ),
                ts.clone(),
            );
            msg.user_name = Some(names[user].to_string());

            if i % 5 == 0 {
                msg.thread_messages = (1..=3)
                    .map(|r| {
                        let mut reply = Message::new(
                            users[(user + r) % users.len()],
                            format!("Reply {r} to {i}"),
                            format!("{}.{:06}", base + i as i64 * 60 + r as i64, r),
                        )
                        .in_thread(ts.clone());
                        reply.user_name = Some(names[(user + r) % users.len()].to_string());
                        reply
                    })
                    .collect();
                msg = msg.with_replies(3);
            }
            msg
        })
        .collect();

    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    Archive::new(
        ArchiveMetadata::from_channel(&Channel::new("C0GENERAL1", "general"), at),
        messages,
    )
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for size in [100, 1000, 10000].iter() {
        let data = serde_json::to_string(&generate_archive(*size)).unwrap();
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_with_input(BenchmarkId::new("from_str", size), &data, |b, data| {
            b.iter(|| {
                let archive: Archive = serde_json::from_str(data).unwrap();
                black_box(archive)
            });
        });
    }

    group.finish();
}

fn bench_markup(c: &mut Criterion) {
    let text = "Ping <@U1|alice> in <#C0RANDOM01|random>: see <https://ci.example.com/42|build 42> &lt;now&gt; <!here>";
    let resolver = MentionResolver::default();

    let mut group = c.benchmark_group("markup");
    group.bench_function("parse", |b| b.iter(|| black_box(parse(black_box(text)))));
    group.bench_function("plain", |b| b.iter(|| black_box(resolver.plain(black_box(text)))));
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let archive = generate_archive(1000);
    let options = ExportOptions::default();

    let mut group = c.benchmark_group("export");

    for format in [
        ExportFormat::Html,
        ExportFormat::Markdown,
        ExportFormat::Text,
        ExportFormat::Csv,
    ] {
        group.bench_function(format.extension(), |b| {
            b.iter(|| {
                let output = export_to_string(&archive, format, &options).unwrap();
                black_box(output)
            });
        });
    }

    group.finish();
}

fn bench_reader(c: &mut Criterion) {
    let archive = generate_archive(1000);

    let mut group = c.benchmark_group("reader");
    group.bench_function("rows", |b| b.iter(|| black_box(message_rows(&archive))));
    group.bench_function("search", |b| {
        b.iter(|| black_box(search_messages(&archive, "reply 2", false).len()))
    });
    group.finish();
}

criterion_group!(benches, bench_load, bench_markup, bench_export, bench_reader);
criterion_main!(benches);
