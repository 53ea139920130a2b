use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dirsearch_core::dumps::LoadedDumps;
use dirsearch_core::{build_from_dumps, search, EngineConfig};
use serde_json::{json, Map, Value};

const SUBJECTS: &[&str] = &["Computer Science", "Mathematics", "Physics", "History", "Design"];

/// A few thousand synthetic courses and employees.
fn synthetic_dumps() -> LoadedDumps {
    let courses: Vec<Value> = (0..3000)
        .map(|i| {
            let subject = SUBJECTS[i % SUBJECTS.len()];
            json!({
                "subject": format!("{}", 10 + i % 90),
                "number": format!("{}", 100 + i),
                "title": format!("{subject} topic {i}"),
                "description": format!("An introduction to {subject} covering lecture {} and lab {}", i % 17, i % 31),
                "sections": [{"section": "A", "instructor": format!("Instructor {}", i % 200)}]
            })
        })
        .collect();
    let employees: Map<String, Value> = (0..2000)
        .map(|i| {
            let dept = SUBJECTS[i % SUBJECTS.len()];
            (format!("emp{i}"), json!({"name": format!("Person {i}"), "department": dept, "title": "Staff"}))
        })
        .collect();
    LoadedDumps {
        courses: Some(json!({"CMU": {"F24": courses}})),
        employees: Some(Value::Object(employees)),
        ..Default::default()
    }
}

fn bench_search(c: &mut Criterion) {
    let dumps = synthetic_dumps();
    let config = EngineConfig::default();
    c.bench_function("build_index", |b| b.iter(|| build_from_dumps(black_box(&dumps), &config)));

    let index = build_from_dumps(&dumps, &config).expect("dumps load");
    c.bench_function("search_common_term", |b| b.iter(|| search(&index, black_box("computer science"), 0, 20)));
    c.bench_function("search_rare_term", |b| b.iter(|| search(&index, black_box("topic 1234"), 0, 20)));
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
