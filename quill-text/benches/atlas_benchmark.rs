use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quill_text::mesh::assemble;
use quill_text::{GlyphAtlas, GlyphBitmap, ShapedGlyph, TextError, SUBPIXEL_BITS};

fn bitmap(w: u32, h: u32) -> GlyphBitmap {
    GlyphBitmap {
        width: w,
        rows: h,
        pitch: w as i32,
        left: 0,
        top: h as i32,
        advance: w as f32,
        data: vec![0xff; (w * h) as usize],
    }
}

fn bench_atlas_insert(c: &mut Criterion) {
    c.bench_function("atlas_insert_16x20", |b| {
        let mut atlas = GlyphAtlas::new(1024, 1024);
        let mut id = 0u16;
        b.iter(|| {
            id = id.wrapping_add(1);
            let _ = atlas.ensure(black_box(id), || Ok(bitmap(16, 20)));
        });
    });
}

fn bench_atlas_lookup(c: &mut Criterion) {
    let mut atlas = GlyphAtlas::new(1024, 1024);
    for id in 0..100u16 {
        atlas
            .ensure(id, || Ok(bitmap(12, 14)))
            .expect("prepopulation fits");
    }

    c.bench_function("atlas_lookup", |b| {
        let mut id = 0u16;
        b.iter(|| {
            id = (id + 1) % 100;
            atlas.get(black_box(id));
        });
    });
}

fn bench_mesh_assembly(c: &mut Criterion) {
    let mut atlas = GlyphAtlas::new(1024, 1024);
    for id in 0..64u16 {
        atlas
            .ensure(id, || Ok(bitmap(14, 18)))
            .expect("prepopulation fits");
    }

    let shaped: Vec<ShapedGlyph> = (0..500)
        .map(|i| ShapedGlyph {
            glyph_id: (i % 64) as u16,
            x_advance: 15 << SUBPIXEL_BITS,
            y_advance: 0,
            x_offset: 0,
            y_offset: 0,
        })
        .collect();

    c.bench_function("assemble_500_glyphs", |b| {
        b.iter(|| {
            assemble(black_box(&shaped), |id| {
                atlas.get(id).ok_or(TextError::UncachedGlyph(id))
            })
        });
    });
}

criterion_group!(
    benches,
    bench_atlas_insert,
    bench_atlas_lookup,
    bench_mesh_assembly
);
criterion_main!(benches);
