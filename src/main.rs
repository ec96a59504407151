use std::{cell::RefCell, rc::Rc, time::Instant};

use ocr_overlay::{
    compose_view, Dimensions, FragmentSet, Highlighter, ImageOverlay, SurfaceMetrics,
};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

fn main() {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let image_path = args.next().unwrap_or_else(|| "tests/data/menu.png".into());
    let payload_path = args
        .next()
        .unwrap_or_else(|| "tests/data/menu_fields.json".into());
    let index = args
        .next()
        .map(|it| it.parse().expect("Fragment index must be a number"))
        .unwrap_or(0);

    let image = image::open(&image_path).expect("Failed to load image");
    let payload = std::fs::read_to_string(&payload_path).expect("Failed to read payload");
    let fragments = FragmentSet::from_payload_str(&payload).expect("Failed to parse payload");
    log::debug!("{} fragments in {payload_path}", fragments.len());

    let rendered = Dimensions::new(800.0, 600.0);
    let view = compose_view(&image, rendered).expect("Failed to compose view");
    let overlay = Rc::new(RefCell::new(ImageOverlay::new(view)));

    let mut highlighter = Highlighter::builder()
        .fragments(fragments)
        .overlay(overlay.clone())
        .surface(SurfaceMetrics::new(Dimensions::of(&image), rendered))
        .build();

    let start = Instant::now();
    let rect = highlighter.select(index).expect("Failed to select fragment");
    let end = start.elapsed();
    log::debug!("{end:?}");
    log::debug!("{rect:#?}");
    if let Some(fragment) = highlighter.selected_fragment() {
        log::debug!("selected {:?}", fragment.text);
    }

    overlay
        .borrow()
        .render()
        .save("highlight.png")
        .expect("Failed to save highlight image");
}
