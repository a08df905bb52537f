//! Turns session state into frames of draw requests.

use crate::config::SessionConfig;
use crate::layout::{stimulus_anchor, OptionButton};
use stroop_core::{Bounds, Frame, Locale, OptionStyle, Rgb, Stimulus, StimulusPolicy};

const LINE_SPACING: f32 = 10.0;
const BORDER_WIDTH: f32 = 2.0;
const CONTINUE_SIZE: f32 = 80.0;

/// Where the "?" acknowledgement button sits.
pub fn continue_button(surface: (f32, f32)) -> Bounds {
    Bounds::centered((surface.0 * 0.5, surface.1 * 0.75), CONTINUE_SIZE, CONTINUE_SIZE)
}

pub fn instruction_frame(
    text: &str,
    config: &SessionConfig,
    locale: &Locale,
    surface: (f32, f32),
    acknowledge: Option<Bounds>,
) -> Frame {
    let mut frame = Frame::blank();
    let bottom = frame.paragraph(
        text,
        config.instruction_font_px,
        Rgb::BLACK,
        (surface.0 * 0.5, 100.0),
        LINE_SPACING,
    );

    if let Some(button) = acknowledge {
        frame.text(
            locale.continue_hint(),
            config.button_font_px,
            Rgb::BLACK,
            (surface.0 * 0.5, bottom + config.button_font_px),
        );
        frame.fill_rect(button, Rgb::LIGHT_GRAY);
        frame.stroke_rect(button, Rgb::BLACK, BORDER_WIDTH);
        frame.text("?", config.instruction_font_px, Rgb::BLACK, button.center());
    }
    frame
}

pub fn trial_frame(
    stimulus: &Stimulus,
    options: &[OptionButton],
    style: OptionStyle,
    config: &SessionConfig,
    locale: &Locale,
    surface: (f32, f32),
) -> Frame {
    let mut frame = Frame::blank();
    let anchor = stimulus_anchor(config.layout, surface);
    let word = stimulus.label().map(|key| locale.color_word(key));

    match stimulus.policy() {
        StimulusPolicy::StandardText | StimulusPolicy::IncongruentText => {
            if let Some(word) = word {
                let ink = stimulus.ink().unwrap_or(Rgb::BLACK);
                frame.text(word, config.stimulus_font_px, ink, anchor);
            }
        }
        StimulusPolicy::StandardSwatch | StimulusPolicy::IncongruentSwatch => {
            let ink = stimulus.ink().unwrap_or(Rgb::BLACK);
            let size = config.swatch_size;
            frame.fill_rect(Bounds::centered(anchor, size, size), ink);
            if let Some(word) = word {
                frame.text(word, config.stimulus_font_px * 0.6, contrast_on(ink), anchor);
            }
        }
    }

    for option in options {
        let (fill, text) = match style {
            OptionStyle::ColorFilled => {
                let fill = config.palette.rgb_of(&option.name).unwrap_or(Rgb::LIGHT_GRAY);
                (fill, Rgb::WHITE)
            }
            OptionStyle::TextLabeled => (Rgb::LIGHT_GRAY, Rgb::BLACK),
        };
        frame.fill_rect(option.bounds, fill);
        frame.stroke_rect(option.bounds, Rgb::BLACK, BORDER_WIDTH);
        frame.text(
            locale.color_word(&option.name),
            config.button_font_px,
            text,
            option.bounds.center(),
        );
    }
    frame
}

/// Black or white, whichever reads better on `background`.
fn contrast_on(background: Rgb) -> Rgb {
    let Rgb(r, g, b) = background;
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 140.0 { Rgb::BLACK } else { Rgb::WHITE }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::arrange;
    use stroop_core::DrawCommand;

    const SURFACE: (f32, f32) = (1280.0, 1024.0);

    fn setup() -> (SessionConfig, Locale, Vec<OptionButton>) {
        let config = SessionConfig::default();
        let locale = Locale::resolve("en").unwrap();
        let options = arrange(config.layout, &config.palette, SURFACE, config.button_size);
        (config, locale, options)
    }

    #[test]
    fn incongruent_text_draws_word_in_ink() {
        let (config, locale, options) = setup();
        let stim =
            Stimulus::incongruent(StimulusPolicy::IncongruentText, &config.palette, 0, 1).unwrap();
        let frame = trial_frame(&stim, &options, stim.policy().option_style(), &config, &locale, SURFACE);
        assert_eq!(
            frame.commands[0],
            DrawCommand::Text {
                text: "RED".to_string(),
                size: 74.0,
                color: Rgb(0, 255, 0),
                center: stimulus_anchor(config.layout, SURFACE),
            }
        );
        // fill, border and label per option
        assert_eq!(frame.commands.len(), 1 + options.len() * 3);
    }

    #[test]
    fn swatch_blocks_use_text_buttons() {
        let (config, locale, options) = setup();
        let stim =
            Stimulus::standard(StimulusPolicy::StandardSwatch, &config.palette, 2).unwrap();
        let frame = trial_frame(&stim, &options, stim.policy().option_style(), &config, &locale, SURFACE);
        assert!(matches!(
            frame.commands[0],
            DrawCommand::FillRect { color: Rgb(0, 0, 255), .. }
        ));
        assert!(matches!(
            frame.commands[1],
            DrawCommand::FillRect { color: Rgb::LIGHT_GRAY, .. }
        ));
    }

    #[test]
    fn words_are_localized() {
        let (config, _, options) = setup();
        let locale = Locale::resolve("hu").unwrap();
        let stim = Stimulus::standard(StimulusPolicy::StandardText, &config.palette, 0).unwrap();
        let frame = trial_frame(&stim, &options, stim.policy().option_style(), &config, &locale, SURFACE);
        let texts: Vec<_> = frame.texts().collect();
        assert_eq!(texts[0], "PIROS");
        assert!(texts.contains(&"NARANCS"));
    }

    #[test]
    fn click_mode_draws_continue_button() {
        let (config, locale, _) = setup();
        let button = continue_button(SURFACE);
        let frame = instruction_frame("line one\nline two", &config, &locale, SURFACE, Some(button));
        let texts: Vec<_> = frame.texts().collect();
        assert_eq!(texts, vec!["line one", "line two", "Click the ? to continue", "?"]);

        let timed = instruction_frame("line one", &config, &locale, SURFACE, None);
        assert_eq!(timed.commands.len(), 1);
    }
}
