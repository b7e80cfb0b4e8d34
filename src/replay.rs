//! Deterministic frame replays.
//!
//! A [`ReplayScript`] describes a page layout, a configuration and a list of
//! inputs keyed by frame number. [`run_replay`] mounts the page on a stage
//! with a [`RecordingSink`], steps frames at a fixed interval, and reports
//! every trigger dispatch together with the final property values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::binder::{MountedSection, Section};
use crate::config::StageConfig;
use crate::effects::{PropertyWrite, RecordingSink};
use crate::error::{ReelError, Result};
use crate::geometry::StaticLayout;
use crate::scroll::{ScrollState, ScrollTarget, ScrollToOptions};
use crate::sections;
use crate::stage::{DispatchRecord, Stage};
use crate::stats::FrameStats;

fn default_interval() -> f64 {
    1000.0 / 60.0
}

fn default_frames() -> u32 {
    120
}

/// One input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplayAction {
    Wheel { delta: f64 },
    Touch { delta: f64 },
    NativeScroll { offset: f64 },
    ScrollTo {
        target: ScrollTarget,
        #[serde(default)]
        options: ScrollToOptions,
    },
    ScrollToSection { name: String },
    Resize {
        #[serde(rename = "viewportHeight")]
        viewport_height: f64,
    },
    Mount { section: String },
    Unmount { section: String },
}

/// An input applied just before the given frame runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedAction {
    pub frame: u32,
    #[serde(flatten)]
    pub action: ReplayAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    #[serde(default)]
    pub config: StageConfig,
    pub layout: StaticLayout,
    /// Sections to mount; the whole portfolio when absent.
    #[serde(default)]
    pub sections: Option<Vec<String>>,
    #[serde(default = "default_frames")]
    pub frames: u32,
    #[serde(default = "default_interval")]
    pub frame_interval_ms: f64,
    #[serde(default)]
    pub actions: Vec<TimedAction>,
}

impl ReplayScript {
    pub fn from_json(json: &str) -> Result<Self> {
        let script: Self = serde_json::from_str(json)?;
        script.config.validate()?;
        if !(script.frame_interval_ms.is_finite() && script.frame_interval_ms > 0.0) {
            return Err(ReelError::Config(format!(
                "frameIntervalMs must be positive, got {}",
                script.frame_interval_ms
            )));
        }
        Ok(script)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub frames: u32,
    pub events: Vec<DispatchRecord>,
    /// Latest value of every property written during the run.
    pub properties: Vec<PropertyWrite>,
    pub final_state: Option<ScrollState>,
    pub active_section: Option<String>,
    pub mounted: Vec<String>,
    pub stats: FrameStats,
}

/// Run a script to completion.
pub fn run_replay(script: &ReplayScript) -> Result<ReplayReport> {
    let sink = RecordingSink::new();
    let mut layout = script.layout.clone();
    let stage = Stage::new(
        script.config.clone(),
        Box::new(layout.clone()),
        Box::new(sink.clone()),
    );
    stage.record_dispatches(true);

    let mut mounted: BTreeMap<String, MountedSection> = BTreeMap::new();
    let initial: Vec<Box<dyn Section>> = match &script.sections {
        Some(names) => names
            .iter()
            .filter_map(|name| {
                let section = sections::by_name(name);
                if section.is_none() {
                    tracing::warn!(section = %name, "unknown section in script");
                }
                section
            })
            .collect(),
        None => sections::portfolio_sections(),
    };
    for section in initial {
        let name = section.name().to_string();
        mounted.insert(name, stage.mount(section));
    }

    let mut actions: Vec<&TimedAction> = script.actions.iter().collect();
    actions.sort_by_key(|action| action.frame);
    let mut pending = actions.into_iter().peekable();

    for frame in 0..script.frames {
        while let Some(timed) = pending.next_if(|timed| timed.frame <= frame) {
            tracing::debug!(frame, action = ?timed.action, "replay input");
            apply(&stage, &mut layout, &mut mounted, &timed.action);
        }
        stage.frame((f64::from(frame) + 1.0) * script.frame_interval_ms);
    }

    let report = ReplayReport {
        frames: script.frames,
        events: stage.take_dispatch_log(),
        properties: sink.snapshot(),
        final_state: stage.scroll_state(),
        active_section: stage.active_section(),
        mounted: stage.mounted_sections(),
        stats: stage.stats(),
    };
    drop(mounted);
    stage.destroy();
    Ok(report)
}

fn apply(
    stage: &Stage,
    layout: &mut StaticLayout,
    mounted: &mut BTreeMap<String, MountedSection>,
    action: &ReplayAction,
) {
    match action {
        ReplayAction::Wheel { delta } => stage.on_wheel(*delta),
        ReplayAction::Touch { delta } => stage.on_touch(*delta),
        ReplayAction::NativeScroll { offset } => stage.on_native_scroll(*offset),
        ReplayAction::ScrollTo { target, options } => {
            stage.scroll_to(target, *options);
        }
        ReplayAction::ScrollToSection { name } => {
            stage.scroll_to_section(name);
        }
        ReplayAction::Resize { viewport_height } => {
            layout.viewport_height = *viewport_height;
            stage.set_geometry(Box::new(layout.clone()));
        }
        ReplayAction::Mount { section } => match sections::by_name(section) {
            Some(built) => {
                // Replacing an existing instance unmounts it first.
                mounted.remove(section);
                mounted.insert(section.clone(), stage.mount(built));
            }
            None => tracing::warn!(%section, "unknown section, not mounted"),
        },
        ReplayAction::Unmount { section } => {
            if let Some(instance) = mounted.remove(section) {
                instance.unmount();
            }
        }
    }
}
