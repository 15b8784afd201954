//! Performance benchmarks for thread flattening and preview sanitizing
//!
//! Run with: cargo bench

use std::collections::HashSet;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use postboard::models::Post;
use postboard::preview;
use postboard::state::InteractionState;
use postboard::store::visible_rows_in;

/// A page of `roots` posts, each with a reply chain `depth` deep
fn generate_page(roots: usize, depth: usize) -> Vec<Post> {
    let mut next_id = 1u64;
    let mut make = |parent_id: Option<u64>| {
        let id = next_id;
        next_id += 1;
        Post {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            homepage_url: None,
            body_html: "A <strong>reply</strong> with <code>code</code>".to_string(),
            created_at: Utc::now(),
            updated_at: None,
            parent_id,
            attachments: Vec::new(),
            replies: Vec::new(),
        }
    };

    (0..roots)
        .map(|_| {
            let mut chain: Vec<Post> = Vec::with_capacity(depth + 1);
            chain.push(make(None));
            for _ in 0..depth {
                let parent = chain.last().map(|p| p.id);
                chain.push(make(parent));
            }
            let mut node = chain.pop().expect("chain is never empty");
            while let Some(mut parent) = chain.pop() {
                parent.replies.push(node);
                node = parent;
            }
            node
        })
        .collect()
}

fn expand_everything(posts: &[Post]) -> InteractionState {
    let mut ids = HashSet::new();
    let mut stack: Vec<&Post> = posts.iter().collect();
    while let Some(post) = stack.pop() {
        ids.insert(post.id);
        stack.extend(post.replies.iter());
    }
    let mut interaction = InteractionState::new();
    interaction.expand_all(ids);
    interaction
}

fn bench_visible_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("visible_rows");
    for depth in [1, 10, 100] {
        let page = generate_page(25, depth);
        let interaction = expand_everything(&page);
        group.throughput(Throughput::Elements((25 * (depth + 1)) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &page, |b, page| {
            b.iter(|| visible_rows_in(black_box(page), &interaction, 64).len())
        });
    }
    group.finish();
}

fn bench_preview(c: &mut Criterion) {
    let mut group = c.benchmark_group("preview_render");
    let paragraph = "Some <strong>bold</strong> and <i>italic</i> text with a \
        <a href=\"https://example.com\" title=\"x\" onclick=\"evil()\">link</a>,\n\
        a <script>alert(1)</script> and <code>let x = 1 < 2;</code>\n";
    for paragraphs in [1, 10, 100] {
        let text = paragraph.repeat(paragraphs);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &text, |b, text| {
            b.iter(|| preview::render(black_box(text)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_visible_rows, bench_preview);
criterion_main!(benches);
