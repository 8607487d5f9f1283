//! Demo: drives the engine against a fabricated page surface.
//!
//! There is no real renderer here. The "host" is a fixed-step loop that
//! populates a surface with measured elements, performs one navigation
//! with entrance/exit recipes, scrolls a marquee section into view, and
//! toggles an accordion item, printing engine events as they drain.

use anyhow::Result;
use tracing::info;

use segue_config::SegueConfig;
use segue_engine::{
    Accordion, AccordionStateHandle, BindingRecipe, BindingRegistry, EventQueue, Geometry,
    Marquee, RecipeKind, ScrollTriggerManager, SlideDirection, SplitUnit, Surface,
    TransitionCoordinator, TransitionPhase, TriggerSpec, TweenSpec, Viewport,
};

const FRAME_MS: f32 = 16.0;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = SegueConfig::load_or_default();

    let mut surface = Surface::new();
    populate_home(&mut surface);
    surface.set_fonts_ready();

    let mut events = EventQueue::new();
    let mut registry = BindingRegistry::new();
    let spec = TweenSpec::duration(config.transition.default_duration_ms);
    registry.register(
        "headline",
        BindingRecipe::new(RecipeKind::TextSplit { unit: SplitUnit::Words }).with_spec(spec),
    );
    registry.register(
        "hero",
        BindingRecipe::new(RecipeKind::Slide { direction: SlideDirection::Up }).with_spec(spec),
    );
    registry.register("footer", BindingRecipe::new(RecipeKind::Fade).with_spec(spec));

    let mut coordinator = TransitionCoordinator::new(config.transition.clone());
    coordinator.set_swap_handler(|surface| {
        surface.swap_document(populate_work);
    });

    let mut triggers = ScrollTriggerManager::new(&config.triggers);
    let marquee_ids: Vec<String> = (0..9).map(|i| format!("logo-{i}")).collect();
    let mut marquee = Marquee::new(marquee_ids, &config.marquee)?;

    let state_handle = AccordionStateHandle::new();
    let mut accordion = Accordion::new(
        ["marquee-section"],
        state_handle,
        spec,
        config.marquee.measure_retry_budget,
    );
    accordion.add_item("services", "services-panel");

    // First load: entrance, then triggers attach.
    coordinator.start_first_load("/", &mut events);
    run_frames(
        60,
        &mut coordinator,
        &registry,
        &mut surface,
        &mut events,
        &mut triggers,
        &mut marquee,
        &mut accordion,
    );
    // The marquee section only exists on the work page; queue its trigger
    // and let `sync` attach it once the navigation settles.
    triggers.queue_attach(
        "marquee-section",
        TriggerSpec::new("marquee", "top 80%", "bottom top")?,
    );
    info!("first load settled");

    // Navigate; the swap handler replaces the document with the work page.
    coordinator.begin_navigation("/work", &registry, &mut surface, &mut events);
    run_frames(
        120,
        &mut coordinator,
        &registry,
        &mut surface,
        &mut events,
        &mut triggers,
        &mut marquee,
        &mut accordion,
    );
    anyhow::ensure!(
        coordinator.phase() == TransitionPhase::Idle,
        "navigation did not settle"
    );
    let attached = triggers.sync(&coordinator.state_handle().get(), &surface);
    info!(attached, live = triggers.live_count(), "queued triggers attached");
    // The marquee items only exist on the work page; re-measure now.
    marquee.invalidate_layout();

    // Scroll the marquee into view and let it run a few cycles.
    triggers.scroll(
        Viewport { scroll_y: 600.0, height: 800.0 },
        &mut surface,
        &mut events,
    );
    marquee.set_visible(true);
    run_frames(
        120,
        &mut coordinator,
        &registry,
        &mut surface,
        &mut events,
        &mut triggers,
        &mut marquee,
        &mut accordion,
    );
    info!(
        cycle = marquee.cycle_distance(),
        progress = marquee.progress(),
        "marquee running"
    );

    // Expand an accordion panel; its settle requests a trigger refresh.
    accordion.toggle("services", &mut surface)?;
    run_frames(
        120,
        &mut coordinator,
        &registry,
        &mut surface,
        &mut events,
        &mut triggers,
        &mut marquee,
        &mut accordion,
    );
    anyhow::ensure!(!accordion.is_scroll_locked(), "scroll lock not released");

    info!("demo complete");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_frames(
    frames: usize,
    coordinator: &mut TransitionCoordinator,
    registry: &BindingRegistry,
    surface: &mut Surface,
    events: &mut EventQueue,
    triggers: &mut ScrollTriggerManager,
    marquee: &mut Marquee,
    accordion: &mut Accordion,
) {
    for _ in 0..frames {
        coordinator.update(FRAME_MS, registry, surface, events);
        triggers.update(FRAME_MS, surface, events);
        marquee.update(FRAME_MS, surface, events);
        if let Some(request) = accordion.update(FRAME_MS, surface) {
            let sections: Vec<&str> = request.sections.iter().map(String::as_str).collect();
            triggers.request_refresh(Some(&sections));
        }
        for event in events.drain() {
            info!(?event, "engine event");
        }
        // The host watches for the refresh completion to unlock scrolling.
        if accordion.is_scroll_locked() && !triggers.refresh_pending() {
            accordion.notify_refresh_complete();
        }
    }
}

fn populate_home(surface: &mut Surface) {
    surface.insert_with_geometry("hero", Geometry::new(0.0, 0.0, 1280.0, 640.0));
    surface.insert_with_geometry("headline", Geometry::new(180.0, 120.0, 900.0, 120.0));
    let _ = surface.set_text("headline", "we choreograph interfaces");
    surface.insert_with_geometry("footer", Geometry::new(2400.0, 0.0, 1280.0, 200.0));
}

fn populate_work(surface: &mut Surface) {
    surface.insert_with_geometry("hero", Geometry::new(0.0, 0.0, 1280.0, 640.0));
    surface.insert_with_geometry("headline", Geometry::new(180.0, 120.0, 900.0, 120.0));
    let _ = surface.set_text("headline", "selected work");
    surface.insert_with_geometry("footer", Geometry::new(3200.0, 0.0, 1280.0, 200.0));
    surface.insert_with_geometry("marquee", Geometry::new(1400.0, 0.0, 1280.0, 160.0));
    for i in 0..9 {
        surface.insert_with_geometry(
            format!("logo-{i}"),
            Geometry::new(1400.0, i as f64 * 248.0, 200.0, 80.0),
        );
    }
    surface.insert_with_geometry("services", Geometry::new(1700.0, 0.0, 1280.0, 80.0));
    surface.insert_with_geometry("services-panel", Geometry::new(1780.0, 0.0, 1280.0, 320.0));
}
