//! Cross-module orchestration tests: the lifecycle coordinator, binding
//! registry, trigger manager, marquee, and accordion wired together the
//! way a host would wire them, driven by a manually-advanced frame clock.

use std::sync::{Arc, Mutex};

use segue_config::{MarqueeConfig, TransitionConfig, TriggerConfig};
use segue_engine::{
    Accordion, AccordionStateHandle, BindingRecipe, BindingRegistry, EasingFunction, EngineEvent,
    EventQueue, Geometry, Marquee, RecipeKind, ScrollTriggerManager, StyleProperty, Surface,
    TransitionCoordinator, TransitionPhase, TriggerSpec, TweenSpec, Viewport,
};

const FRAME_MS: f32 = 16.0;

fn transition_config() -> TransitionConfig {
    TransitionConfig {
        leave_timeout_ms: 1000.0,
        min_load_ms: 0.0,
        font_fallback_ms: 500.0,
        default_duration_ms: 100.0,
    }
}

fn quick_spec() -> TweenSpec {
    TweenSpec::duration(100.0).with_easing(EasingFunction::Linear)
}

fn page(surface: &mut Surface) {
    surface.insert_with_geometry("hero", Geometry::new(0.0, 0.0, 1280.0, 640.0));
    surface.insert_with_geometry("section", Geometry::new(1000.0, 0.0, 1280.0, 600.0));
}

#[test]
fn leave_completes_before_swap_and_enter_follows() {
    let mut surface = Surface::new();
    page(&mut surface);
    surface.set_fonts_ready();

    let mut registry = BindingRegistry::new();
    registry.register("hero", BindingRecipe::new(RecipeKind::Fade).with_spec(quick_spec()));

    let mut coordinator = TransitionCoordinator::new(transition_config());
    let mut events = EventQueue::new();

    // The swap handler records the outgoing hero's opacity at swap time;
    // a correctly sequenced leave has faded it out fully by then.
    let opacity_at_swap = Arc::new(Mutex::new(None::<f64>));
    let observed = Arc::clone(&opacity_at_swap);
    coordinator.set_swap_handler(move |surface| {
        let opacity = surface
            .inline_style("hero", StyleProperty::Opacity)
            .and_then(|v| v.as_scalar());
        *observed.lock().unwrap() = opacity;
        surface.swap_document(page);
    });

    coordinator.begin_navigation("/work", &registry, &mut surface, &mut events);
    for _ in 0..60 {
        coordinator.update(FRAME_MS, &registry, &mut surface, &mut events);
    }
    assert_eq!(coordinator.phase(), TransitionPhase::Idle);

    let at_swap = opacity_at_swap.lock().unwrap().expect("swap ran");
    assert!(at_swap.abs() < 0.01, "leave incomplete at swap: opacity {at_swap}");

    // The entrance ran on the fresh document after the swap.
    let final_opacity = surface
        .inline_style("hero", StyleProperty::Opacity)
        .and_then(|v| v.as_scalar())
        .unwrap();
    assert!((final_opacity - 1.0).abs() < 0.01);

    // Phase milestones arrive strictly in lifecycle order.
    let phases: Vec<TransitionPhase> = events
        .drain()
        .filter_map(|e| match e {
            EngineEvent::PhaseChanged { phase } => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        [
            TransitionPhase::LeaveRunning,
            TransitionPhase::Swapping,
            TransitionPhase::EnterRunning,
            TransitionPhase::Idle
        ]
    );
}

#[test]
fn trigger_attachment_survives_navigations_without_duplication() {
    let mut surface = Surface::new();
    page(&mut surface);
    surface.set_fonts_ready();

    let registry = BindingRegistry::new();
    let mut coordinator = TransitionCoordinator::new(transition_config());
    coordinator.set_swap_handler(|surface| surface.swap_document(page));
    let mut triggers = ScrollTriggerManager::new(&TriggerConfig::default());
    let mut events = EventQueue::new();

    // First load must complete before anything attaches.
    coordinator.start_first_load("/", &mut events);
    for _ in 0..30 {
        coordinator.update(FRAME_MS, &registry, &mut surface, &mut events);
    }
    triggers
        .attach(
            "services",
            TriggerSpec::new("section", "top 80%", "bottom top").unwrap(),
            &surface,
        )
        .unwrap();

    for round in 0..3 {
        coordinator.begin_navigation(format!("/page-{round}"), &registry, &mut surface, &mut events);
        // Remount: the new page queues the same logical section again.
        triggers.queue_attach(
            "services",
            TriggerSpec::new("section", "top 80%", "bottom top").unwrap(),
        );
        for _ in 0..60 {
            coordinator.update(FRAME_MS, &registry, &mut surface, &mut events);
            triggers.sync(&coordinator.state_handle().get(), &surface);
        }
        assert_eq!(coordinator.phase(), TransitionPhase::Idle);
        assert_eq!(triggers.live_count(), 1, "round {round} duplicated a trigger");
    }
}

#[test]
fn marquee_gates_follow_trigger_edges() {
    let mut surface = Surface::new();
    surface.insert_with_geometry("marquee", Geometry::new(1000.0, 0.0, 1280.0, 160.0));
    let ids: Vec<String> = (0..9).map(|i| format!("logo-{i}")).collect();
    for (i, id) in ids.iter().enumerate() {
        surface.insert_with_geometry(id, Geometry::new(1000.0, i as f64 * 248.0, 200.0, 80.0));
    }

    let marquee = Arc::new(Mutex::new(
        Marquee::new(ids, &MarqueeConfig::default()).unwrap(),
    ));
    // Off-screen until the trigger reports otherwise.
    marquee.lock().unwrap().set_visible(false);

    let mut triggers = ScrollTriggerManager::new(&TriggerConfig::default());
    let spec = {
        let (enter, leave, enter_back, leave_back) = (
            Arc::clone(&marquee),
            Arc::clone(&marquee),
            Arc::clone(&marquee),
            Arc::clone(&marquee),
        );
        TriggerSpec::new("marquee", "top 100%", "bottom top")
            .unwrap()
            .on_enter(move || enter.lock().unwrap().set_visible(true))
            .on_leave(move || leave.lock().unwrap().set_visible(false))
            .on_enter_back(move || enter_back.lock().unwrap().set_visible(true))
            .on_leave_back(move || leave_back.lock().unwrap().set_visible(false))
    };
    triggers.attach("logo-loop", spec, &surface).unwrap();

    let mut events = EventQueue::new();
    let viewport = |scroll_y| Viewport { scroll_y, height: 800.0 };
    let run = |marquee: &Arc<Mutex<Marquee>>, surface: &mut Surface, events: &mut EventQueue| {
        let mut m = marquee.lock().unwrap();
        for _ in 0..10 {
            m.update(FRAME_MS, surface, events);
        }
        m.progress()
    };

    // Not yet scrolled into view: gate holds.
    triggers.scroll(viewport(0.0), &mut surface, &mut events);
    let before = run(&marquee, &mut surface, &mut events);
    assert_eq!(before, 0.0);

    // Range is 200..1160; entering unlocks the loop.
    triggers.scroll(viewport(600.0), &mut surface, &mut events);
    let visible = run(&marquee, &mut surface, &mut events);
    assert!(visible > 0.0);

    // Hover pauses even while visible; hover end resumes.
    marquee.lock().unwrap().set_hovered(true);
    let hovered = run(&marquee, &mut surface, &mut events);
    assert_eq!(hovered, visible);
    marquee.lock().unwrap().set_hovered(false);

    // Scrolling past the end pauses again; hover-exit while hidden must
    // not resume.
    triggers.scroll(viewport(1500.0), &mut surface, &mut events);
    marquee.lock().unwrap().set_hovered(true);
    marquee.lock().unwrap().set_hovered(false);
    let past_end = run(&marquee, &mut surface, &mut events);
    let settled = run(&marquee, &mut surface, &mut events);
    assert_eq!(past_end, settled, "loop advanced while off-screen");

    // Scrolling back up re-enters from below.
    triggers.scroll(viewport(600.0), &mut surface, &mut events);
    let returned = run(&marquee, &mut surface, &mut events);
    assert!(returned != settled);
}

#[test]
fn accordion_settle_refreshes_triggers_then_unlocks_scroll() {
    let mut surface = Surface::new();
    surface.insert_with_geometry("faq-panel", Geometry::new(800.0, 0.0, 1280.0, 300.0));
    // A section below the accordion whose trigger goes stale on reflow.
    surface.insert_with_geometry("below", Geometry::new(1200.0, 0.0, 1280.0, 600.0));

    let mut triggers = ScrollTriggerManager::new(&TriggerConfig {
        refresh_debounce_ms: 50.0,
    });
    triggers
        .attach(
            "below-section",
            TriggerSpec::new("below", "top 80%", "bottom top")
                .unwrap()
                .on_enter(|| {}),
            &surface,
        )
        .unwrap();

    let mut accordion = Accordion::new(
        ["below-section"],
        AccordionStateHandle::new(),
        quick_spec(),
        3,
    );
    accordion.add_item("faq", "faq-panel");

    let mut events = EventQueue::new();
    accordion.toggle("faq", &mut surface).unwrap();
    assert!(accordion.is_scroll_locked());

    let mut refresh_done = false;
    for _ in 0..100 {
        if let Some(request) = accordion.update(FRAME_MS, &mut surface) {
            // The expansion pushed everything below it down by 300px.
            surface
                .set_geometry("below", Geometry::new(1500.0, 0.0, 1280.0, 600.0))
                .unwrap();
            let sections: Vec<&str> = request.sections.iter().map(String::as_str).collect();
            triggers.request_refresh(Some(&sections));
        }
        triggers.update(FRAME_MS, &surface, &mut events);
        if !refresh_done
            && events
                .drain()
                .any(|e| matches!(e, EngineEvent::RefreshCompleted { refreshed: 1 }))
        {
            refresh_done = true;
            accordion.notify_refresh_complete();
        }
    }
    assert!(refresh_done, "trigger refresh never completed");
    assert!(!accordion.is_scroll_locked());

    // The refreshed trigger fires from the post-reflow position, not the
    // stale one. Old start was 1200 - 640 = 560; new start is 860.
    let mut events = EventQueue::new();
    triggers.scroll(
        Viewport { scroll_y: 700.0, height: 800.0 },
        &mut surface,
        &mut events,
    );
    assert!(events.is_empty(), "stale geometry fired the trigger");
    triggers.scroll(
        Viewport { scroll_y: 900.0, height: 800.0 },
        &mut surface,
        &mut events,
    );
    assert!(events.drain().any(|e| matches!(
        e,
        EngineEvent::TriggerFired { .. }
    )));
}
