use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tandem_core::Value;
use tandem_renderer::{ComponentDef, Registry, render_instance};

fn registry() -> Registry {
    Registry::new()
        .with(
            ComponentDef::new(
                "Board",
                concat!(
                    "<h1>{title}</h1>",
                    "<ul>{#each rows as row, i}",
                    r#"<li class:odd={i > 0}><Cell text="{row}"/><button @click="drop(row)">x</button></li>"#,
                    "{:else}<li>empty</li>{/each}</ul>",
                ),
            )
            .field("title", "Board")
            .field("rows", Vec::<&str>::new())
            .method("drop", |_, _| {}),
        )
        .with(ComponentDef::new("Cell", "<span>{text}</span>").field("text", ""))
}

fn bench_render_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("ssr_rows");
    group.sample_size(20);
    let registry = registry();
    for &count in &[10usize, 100, 500] {
        let board = registry.instantiate("Board").expect("instantiate");
        let rows: Vec<Value> = (0..count).map(|i| Value::from(format!("row {i}"))).collect();
        board.set("rows", rows).expect("set rows");
        group.bench_with_input(BenchmarkId::from_parameter(count), &board, |b, board| {
            b.iter(|| {
                let _ = render_instance(&registry, board).expect("render");
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().without_plots();
    targets = bench_render_rows
}
criterion_main!(benches);
