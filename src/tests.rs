use super::*;

const PAGE_HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Color Changer</title>
</head>
<body>
  <h1>Random Background</h1>
  <button id="colorButton" class="btn">Change Color</button>
  <script src="script.js"></script>
</body>
</html>
"#;

fn texts(messages: &[ConsoleMessage], level: ConsoleLevel) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.level == level)
        .map(|m| m.text.clone())
        .collect()
}

#[test]
fn found_button_gets_click_listener_and_success_log() -> Result<()> {
    let h = Harness::from_html(PAGE_HTML)?;
    assert!(h.has_listener("#colorButton", "click")?);
    assert_eq!(
        texts(&h.console_messages(), ConsoleLevel::Log),
        vec!["DOM fully loaded", "Button found successfully!"]
    );
    assert!(texts(&h.console_messages(), ConsoleLevel::Error).is_empty());
    assert_eq!(h.ready_state(), ReadyState::Complete);
    Ok(())
}

#[test]
fn forced_draw_selects_third_palette_entry() -> Result<()> {
    let mut h = Harness::builder(PAGE_HTML)
        .force_random_draws(&[0.3])?
        .build()?;
    h.take_console_messages();

    h.click("#colorButton")?;
    h.assert_background_color("#FFD166")?;
    h.assert_text("#colorButton", "Color: #FFD166")?;
    assert_eq!(
        texts(&h.take_console_messages(), ConsoleLevel::Log),
        vec!["Button clicked!", "Background color changed to: #FFD166"]
    );
    Ok(())
}

#[test]
fn every_bucket_maps_to_its_palette_entry() -> Result<()> {
    for (index, expected) in DEFAULT_PALETTE.iter().enumerate() {
        let draw = SequenceRandom::draw_for_index(index, DEFAULT_PALETTE.len())?;
        let mut h = Harness::builder(PAGE_HTML)
            .force_random_draws(&[draw])?
            .build()?;
        h.click("#colorButton")?;
        h.assert_background_color(expected)?;
        h.assert_text("#colorButton", &format!("Color: {expected}"))?;
    }
    Ok(())
}

#[test]
fn missing_button_logs_error_without_failing() -> Result<()> {
    let html = "<body><button id='otherButton'>Change</button></body>";
    let mut h = Harness::from_html(html)?;

    let messages = h.take_console_messages();
    assert_eq!(
        texts(&messages, ConsoleLevel::Error),
        vec![
            "ERROR: Could not find button with ID \"colorButton\"",
            "Check if the HTML button ID matches the ID the script looks up",
        ]
    );
    assert!(!texts(&messages, ConsoleLevel::Log).contains(&"Button found successfully!".to_string()));
    assert!(texts(&messages, ConsoleLevel::Warn).is_empty());
    assert!(!h.has_listener("#otherButton", "click")?);

    h.click("#otherButton")?;
    assert_eq!(h.background_color()?, "");
    h.assert_text("#otherButton", "Change")?;
    assert!(h.take_console_messages().is_empty());
    Ok(())
}

#[test]
fn misspelled_id_gets_a_suggestion() -> Result<()> {
    let html = "<body><button id='colorButon'>Change Color</button></body>";
    let h = Harness::from_html(html)?;
    assert_eq!(
        texts(&h.console_messages(), ConsoleLevel::Warn),
        vec!["Did you mean \"colorButon\"?"]
    );
    Ok(())
}

#[test]
fn repeated_clicks_are_independent_and_may_repeat() -> Result<()> {
    let mut h = Harness::builder(PAGE_HTML)
        .force_random_draws(&[0.0, 0.0, 0.9])?
        .build()?;

    h.click("#colorButton")?;
    h.assert_background_color("#FF6B6B")?;
    h.click("#colorButton")?;
    h.assert_background_color("#FF6B6B")?;
    h.assert_text("#colorButton", "Color: #FF6B6B")?;
    h.click("#colorButton")?;
    h.assert_background_color("#7209B7")?;
    h.assert_text("#colorButton", "Color: #7209B7")?;
    Ok(())
}

#[test]
fn seeded_pages_pick_the_same_colors() -> Result<()> {
    let mut a = Harness::builder(PAGE_HTML).random_seed(12345).build()?;
    let mut b = Harness::from_html(PAGE_HTML)?;
    b.set_random_seed(12345);

    for _ in 0..5 {
        a.click("#colorButton")?;
        b.click("#colorButton")?;
        assert_eq!(a.background_color()?, b.background_color()?);
        assert_eq!(a.text("#colorButton")?, b.text("#colorButton")?);
    }
    Ok(())
}

#[test]
fn custom_config_changes_id_prefix_and_palette() -> Result<()> {
    let config = ColorButtonConfig::default()
        .with_element_id("paint")
        .with_label_prefix("Background: ")
        .with_palette(Palette::from_codes(&["#000000", "#ffffff"])?);
    let mut h = Harness::builder("<body><button id='paint'>Paint</button></body>")
        .color_button(config)
        .force_random_draws(&[0.75])?
        .build()?;

    h.click("#paint")?;
    h.assert_background_color("#ffffff")?;
    h.assert_text("#paint", "Background: #ffffff")?;
    Ok(())
}

#[test]
fn disabled_button_ignores_clicks() -> Result<()> {
    let html = "<body><button id='colorButton' disabled>Change Color</button></body>";
    let mut h = Harness::from_html(html)?;
    h.click("#colorButton")?;
    h.assert_text("#colorButton", "Change Color")?;
    assert_eq!(h.background_color()?, "");
    Ok(())
}

#[test]
fn background_overwrites_existing_inline_style() -> Result<()> {
    let html = r#"<body style="margin: 0; background-color: white"><button id="colorButton">Go</button></body>"#;
    let mut h = Harness::builder(html).force_random_draws(&[0.5])?.build()?;
    h.click("#colorButton")?;
    assert_eq!(h.style_property("body", "margin")?, "0");
    h.assert_background_color("#118AB2")?;
    assert_eq!(
        h.dump_dom("body")?,
        r#"<body style="margin: 0; background-color: #118AB2;"><button id="colorButton">Color: #118AB2</button></body>"#
    );
    Ok(())
}

#[test]
fn extra_scripts_see_the_bound_button() -> Result<()> {
    struct LabelProbe;

    impl PageScript for LabelProbe {
        fn name(&self) -> &str {
            "label-probe"
        }

        fn install(&self, page: &mut Page) -> Result<()> {
            let document = page.document();
            page.add_event_listener_fn(document, "click", true, |page, event| {
                let label = page.text_content(event.target())?;
                page.console_log(format!("before: {label}"));
                Ok(())
            })?;
            Ok(())
        }
    }

    let mut h = Harness::builder(PAGE_HTML)
        .script(LabelProbe)
        .force_random_draws(&[0.3])?
        .build()?;
    h.take_console_messages();
    h.click("#colorButton")?;

    let logs = texts(&h.take_console_messages(), ConsoleLevel::Log);
    assert_eq!(logs.first().map(String::as_str), Some("before: Change Color"));
    assert_eq!(
        logs.last().map(String::as_str),
        Some("Background color changed to: #FFD166")
    );
    Ok(())
}

#[test]
fn assertion_failure_carries_snippet() -> Result<()> {
    let h = Harness::from_html(PAGE_HTML)?;
    match h.assert_text("#colorButton", "Color: #FFD166") {
        Err(Error::AssertionFailed {
            selector,
            actual,
            dom_snippet,
            ..
        }) => {
            assert_eq!(selector, "#colorButton");
            assert_eq!(actual, "Change Color");
            assert!(dom_snippet.starts_with("<button id=\"colorButton\""));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
fn unknown_selector_is_reported() -> Result<()> {
    let mut h = Harness::from_html(PAGE_HTML)?;
    assert_eq!(
        h.click("#colorButon"),
        Err(Error::SelectorNotFound("#colorButon".into()))
    );
    assert!(matches!(
        h.click("button:hover"),
        Err(Error::UnsupportedSelector(_))
    ));
    Ok(())
}

#[test]
fn trace_records_lifecycle_and_click_dispatch() -> Result<()> {
    let mut h = Harness::builder(PAGE_HTML)
        .options(PageOptions {
            trace: true,
            trace_to_stderr: false,
            ..PageOptions::default()
        })
        .build()?;

    let logs = h.take_trace_logs();
    assert!(logs.iter().any(|line| line == "[script] install color-button"));
    assert!(logs.iter().any(|line| line == "[lifecycle] readyState=interactive"));
    assert!(
        logs.iter()
            .any(|line| line == "[listener] add click on #colorButton capture=false")
    );

    h.click("#colorButton")?;
    let logs = h.take_trace_logs();
    assert!(logs.iter().any(|line| {
        line == "[event] click target=#colorButton current=#colorButton phase=bubble default_prevented=false"
    }));
    assert!(logs.iter().any(|line| line.starts_with("[event] done click")));
    Ok(())
}

#[test]
fn trace_and_console_limits_are_validated() -> Result<()> {
    let mut h = Harness::from_html(PAGE_HTML)?;
    assert!(matches!(h.set_trace_log_limit(0), Err(Error::Config(_))));
    assert!(matches!(h.set_console_limit(0), Err(Error::Config(_))));

    h.set_console_limit(1)?;
    h.force_random_draws(&[0.3])?;
    h.click("#colorButton")?;
    let messages = h.console_messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Background color changed to: #FFD166");
    Ok(())
}

#[test]
fn rejects_invalid_forced_draws() {
    assert!(matches!(
        Harness::builder(PAGE_HTML).force_random_draws(&[1.5]),
        Err(Error::InvalidRandomDraw(_))
    ));
}

#[test]
fn custom_dispatch_respects_immediate_stop() -> Result<()> {
    struct Ping;

    impl PageScript for Ping {
        fn name(&self) -> &str {
            "ping"
        }

        fn install(&self, page: &mut Page) -> Result<()> {
            let document = page.document();
            page.add_event_listener_fn(document, "ping", false, |page, event| {
                page.console_log("first");
                event.prevent_default();
                event.stop_immediate_propagation();
                Ok(())
            })?;
            page.add_event_listener_fn(document, "ping", false, |page, _event| {
                page.console_log("second");
                Ok(())
            })?;
            Ok(())
        }
    }

    let mut h = Harness::builder(PAGE_HTML)
        .without_color_button()
        .script(Ping)
        .build()?;
    h.dispatch("#colorButton", "ping")?;
    h.dispatch("h1", "ping")?;
    assert_eq!(
        texts(&h.take_console_messages(), ConsoleLevel::Log),
        vec!["first", "first"]
    );
    Ok(())
}

#[test]
fn event_tracing_can_be_silenced_without_losing_lifecycle_lines() -> Result<()> {
    let mut h = Harness::builder(PAGE_HTML)
        .options(PageOptions {
            trace: true,
            trace_events: false,
            trace_to_stderr: false,
            ..PageOptions::default()
        })
        .build()?;

    let logs = h.take_trace_logs();
    assert!(logs.iter().any(|line| line == "[script] install color-button"));
    assert!(logs.iter().any(|line| line == "[lifecycle] readyState=complete"));
    assert!(
        !logs
            .iter()
            .any(|line| line.starts_with("[event]") || line.starts_with("[listener]"))
    );

    h.click("#colorButton")?;
    assert!(h.take_trace_logs().is_empty());

    h.set_trace_events(true);
    h.click("#colorButton")?;
    assert!(
        h.take_trace_logs()
            .iter()
            .any(|line| line.starts_with("[event] done click"))
    );
    Ok(())
}

#[test]
fn tracing_enabled_after_load_records_later_clicks() -> Result<()> {
    let mut h = Harness::builder(PAGE_HTML).trace(false).build()?;
    assert!(h.take_trace_logs().is_empty());

    h.click("#colorButton")?;
    assert!(h.take_trace_logs().is_empty());

    h.set_trace_stderr(false);
    h.enable_trace(true);
    h.click("#colorButton")?;
    let logs = h.take_trace_logs();
    assert!(logs.iter().any(|line| {
        line == "[event] click target=#colorButton current=#colorButton phase=bubble default_prevented=false"
    }));
    assert!(!logs.iter().any(|line| line.starts_with("[lifecycle]")));

    h.enable_trace(false);
    h.click("#colorButton")?;
    assert!(h.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn builder_trace_flag_records_install_and_lifecycle() -> Result<()> {
    let mut h = Harness::builder(PAGE_HTML).trace(true).build()?;
    h.set_trace_stderr(false);
    let logs = h.take_trace_logs();
    assert_eq!(logs.first().map(String::as_str), Some("[script] install color-button"));
    assert!(logs.iter().any(|line| line == "[lifecycle] readyState=interactive"));
    Ok(())
}

// Only the captured buffers are asserted; the stderr echo itself is not
// intercepted by the test harness.
#[test]
fn stderr_echo_keeps_capturing_console_and_trace() -> Result<()> {
    let mut h = Harness::builder(PAGE_HTML)
        .force_random_draws(&[0.3])?
        .build()?;
    h.take_console_messages();
    h.set_console_stderr(true);
    h.set_trace_stderr(true);
    h.enable_trace(true);

    h.click("#colorButton")?;
    assert_eq!(
        texts(&h.take_console_messages(), ConsoleLevel::Log),
        vec!["Button clicked!", "Background color changed to: #FFD166"]
    );
    assert!(!h.take_trace_logs().is_empty());

    h.set_console_stderr(false);
    h.set_trace_stderr(false);
    h.click("#colorButton")?;
    assert_eq!(h.take_console_messages().len(), 2);
    assert!(!h.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn document_capture_runs_before_and_bubble_after_the_click_responder() -> Result<()> {
    struct PhaseLogger;

    impl PageScript for PhaseLogger {
        fn name(&self) -> &str {
            "phase-logger"
        }

        fn install(&self, page: &mut Page) -> Result<()> {
            let document = page.document();
            page.add_event_listener_fn(document, "click", false, |page, _event| {
                page.console_log("document bubble");
                Ok(())
            })?;
            page.add_event_listener_fn(document, "click", true, |page, _event| {
                page.console_log("document capture");
                Ok(())
            })?;
            Ok(())
        }
    }

    let mut h = Harness::builder(PAGE_HTML)
        .script(PhaseLogger)
        .force_random_draws(&[0.3])?
        .build()?;
    h.take_console_messages();
    h.click("#colorButton")?;
    assert_eq!(
        texts(&h.take_console_messages(), ConsoleLevel::Log),
        vec![
            "document capture",
            "Button clicked!",
            "Background color changed to: #FFD166",
            "document bubble",
        ]
    );
    Ok(())
}
