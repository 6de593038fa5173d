//! Damage tracking checks: every pixel a frame changes lies inside the
//! frame's dirty rectangle and the content clip, an incremental frame is
//! pixel-identical to painting the same state from scratch, and the chrome
//! never changes after initialisation.

use proptest::prelude::*;
use tofi::core::style::{Color, Orientation};
use tofi::render::buffers::BufferPair;
use tofi::render::text::NamedFontBackend;
use tofi::runtime::shm::ShmRegion;
use tofi::{filter, CandidateList, Command, InputModel, Renderer, Settings};

const WIDTH: u32 = 240;
const HEIGHT: u32 = 160;

fn settings(horizontal: bool) -> Settings {
    let mut settings = Settings::default();
    settings.style.font_name = "tofi-test-builtin-font".to_string();
    settings.style.font_size = 8;
    settings.style.selection_background = Color::rgb(0x30, 0x30, 0x30);
    settings.style.selection_background_padding = 2;
    settings.style.selection_highlight = Some(Color::rgb(0x00, 0xff, 0x00));
    settings.layout.width = WIDTH;
    settings.layout.height = HEIGHT;
    if horizontal {
        settings.layout.orientation = Orientation::Horizontal;
    }
    settings
}

fn new_renderer(settings: &Settings) -> Renderer {
    let backend = Box::new(NamedFontBackend::new(&settings.style));
    Renderer::new(settings.style.clone(), &settings.layout, backend).expect("renderer")
}

fn new_buffers() -> BufferPair {
    BufferPair::new(ShmRegion::heap(2 * (WIDTH * HEIGHT) as usize), WIDTH, HEIGHT).expect("buffers")
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => prop::sample::select(vec!['a', 'e', 'o', 'x']).prop_map(Command::Insert),
        1 => Just(Command::DeleteChar),
        1 => Just(Command::Clear),
        2 => Just(Command::Previous),
        3 => Just(Command::Next),
    ]
}

fn words() -> CandidateList {
    CandidateList::from_displays([
        "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa", "lambda", "omicron",
        "xerox", "boxes", "oak", "area",
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn frames_only_touch_damaged_pixels(
        commands in prop::collection::vec(command_strategy(), 1..16),
        horizontal in any::<bool>(),
    ) {
        let settings = settings(horizontal);
        let list = words();
        let mut renderer = new_renderer(&settings);
        let mut buffers = new_buffers();
        let mut model = InputModel::new(filter(&list, "", false));
        renderer.init(&mut buffers, &mut model, &list);
        let chrome: Vec<u32> = buffers.buffer(0).to_vec();
        let clip = renderer.clip();

        for command in commands {
            if model.apply(command) {
                model.replace_view(filter(&list, model.query().as_str(), false));
            }
            let target = renderer.active_index() ^ 1;
            if target == 1 && !renderer.is_seeded() {
                renderer.seed_second_buffer(&mut buffers);
            }
            let before = buffers.buffer(target).to_vec();
            let snapshot = model.clone();
            let report = renderer.render(&mut buffers, &mut model, &list);
            prop_assert_eq!(report.buffer, target);

            let after = buffers.buffer(target);
            for (i, (old, new)) in before.iter().zip(after).enumerate() {
                if old != new {
                    let (x, y) = ((i as u32 % WIDTH) as i32, (i as u32 / WIDTH) as i32);
                    prop_assert!(report.dirty.contains(x, y), "pixel ({}, {}) outside {:?}", x, y, report.dirty);
                    prop_assert!(clip.contains(x, y), "pixel ({}, {}) outside clip {:?}", x, y, clip);
                }
            }
            for rect in renderer.damage(target) {
                prop_assert_eq!(rect.intersect(&clip), *rect);
            }

            // Outside the clip both buffers still hold the original chrome.
            for buffer in 0..2 {
                for (i, (&now, &initial)) in buffers.buffer(buffer).iter().zip(&chrome).enumerate() {
                    let (x, y) = ((i as u32 % WIDTH) as i32, (i as u32 / WIDTH) as i32);
                    if !clip.contains(x, y) {
                        prop_assert_eq!(now, initial);
                    }
                }
            }

            // Repainting the same state from scratch gives the same pixels.
            let mut fresh_renderer = new_renderer(&settings);
            let mut fresh_buffers = new_buffers();
            let mut fresh_model = snapshot;
            fresh_renderer.init(&mut fresh_buffers, &mut fresh_model, &list);
            prop_assert!(fresh_buffers.buffer(0) == buffers.buffer(target), "incremental frame differs from full repaint");
        }
    }
}

#[test]
fn buffers_are_identical_after_seeding() {
    let settings = settings(false);
    let list = words();
    let mut renderer = new_renderer(&settings);
    let mut buffers = new_buffers();
    let mut model = InputModel::new(filter(&list, "", false));
    let report = renderer.init(&mut buffers, &mut model, &list);
    assert_eq!(report.dirty, renderer.bounds());
    assert!(renderer.seed_second_buffer(&mut buffers));
    assert!(!renderer.seed_second_buffer(&mut buffers));
    assert_eq!(buffers.buffer(0), buffers.buffer(1));
    assert_eq!(renderer.damage(0), renderer.damage(1));
}
