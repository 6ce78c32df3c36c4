use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
    },
};

use bevy::prelude::*;


/// Passive receiver of load progress.
///
/// Events carry no request id, so one sink should only observe one request
/// at a time.
pub trait ProgressSink: Send + Sync {
    fn start(&self, label: &str);
    fn update(&self, text: &str, percentage: f32);
    fn end(&self);

    fn busy(&self, _active: bool) {}
}


/// Open progress for one request. Updates never go backwards and `end` is
/// sent exactly once, when the scope drops, whether or not the load succeeded.
pub struct ProgressScope<'a> {
    sink: &'a dyn ProgressSink,
    percentage: f32,
}

impl<'a> ProgressScope<'a> {
    pub fn open(sink: &'a dyn ProgressSink, label: &str) -> Self {
        sink.start(label);

        Self {
            sink,
            percentage: 0.0,
        }
    }

    pub fn update(&mut self, text: &str, percentage: f32) {
        if !percentage.is_nan() {
            self.percentage = percentage.clamp(self.percentage, 100.0);
        }
        self.sink.update(text, self.percentage);
    }
}

impl Drop for ProgressScope<'_> {
    fn drop(&mut self) {
        self.sink.end();
    }
}


pub struct BusyScope<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> BusyScope<'a> {
    pub fn open(sink: &'a dyn ProgressSink) -> Self {
        sink.busy(true);
        Self { sink }
    }
}

impl Drop for BusyScope<'_> {
    fn drop(&mut self) {
        self.sink.busy(false);
    }
}


#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _label: &str) {}
    fn update(&self, _text: &str, _percentage: f32) {}
    fn end(&self) {}
}


#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    Start(String),
    Update {
        text: String,
        percentage: f32,
    },
    End,
    Busy(bool),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps every event in order of arrival.
#[derive(Clone, Debug, Default)]
pub struct ProgressRecorder {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressRecorder {
    pub fn events(&self) -> Vec<ProgressEvent> {
        lock(&self.events).clone()
    }

    pub fn percentages(&self) -> Vec<f32> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Update { percentage, .. } => Some(*percentage),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&ProgressEvent) -> bool) -> usize {
        lock(&self.events).iter().filter(|event| matches(event)).count()
    }

    fn push(&self, event: ProgressEvent) {
        lock(&self.events).push(event);
    }
}

impl ProgressSink for ProgressRecorder {
    fn start(&self, label: &str) {
        self.push(ProgressEvent::Start(label.to_string()));
    }

    fn update(&self, text: &str, percentage: f32) {
        self.push(ProgressEvent::Update {
            text: text.to_string(),
            percentage,
        });
    }

    fn end(&self) {
        self.push(ProgressEvent::End);
    }

    fn busy(&self, active: bool) {
        self.push(ProgressEvent::Busy(active));
    }
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressState {
    pub label: Option<String>,
    pub text: String,
    pub percentage: f32,
    pub active: bool,
    pub busy: bool,
    /// board revision of the last change to this request
    pub revision: u64,
}

#[derive(Debug, Default)]
struct ProgressBoard {
    revision: u64,
    requests: HashMap<String, ProgressState>,
}

/// Progress of every load the plugin's loader has seen, keyed by asset path.
///
/// Loads run concurrently on the io task pool, so each one reports through its
/// own [`RequestProgress`]. Finished requests keep their final state.
#[derive(Clone, Debug, Default, Resource)]
pub struct LoadProgress(Arc<Mutex<ProgressBoard>>);

impl LoadProgress {
    pub fn request(&self, key: impl Into<String>) -> RequestProgress {
        RequestProgress {
            board: self.clone(),
            key: key.into(),
        }
    }

    pub fn snapshot(&self, key: &str) -> Option<ProgressState> {
        lock(&self.0).requests.get(key).cloned()
    }

    /// every request, sorted by key
    pub fn snapshots(&self) -> Vec<(String, ProgressState)> {
        let mut snapshots: Vec<_> = lock(&self.0)
            .requests
            .iter()
            .map(|(key, state)| (key.clone(), state.clone()))
            .collect();

        snapshots.sort_by(|a, b| a.0.cmp(&b.0));
        snapshots
    }

    pub fn revision(&self) -> u64 {
        lock(&self.0).revision
    }

    fn modify(&self, key: &str, f: impl FnOnce(&mut ProgressState)) {
        let mut board = lock(&self.0);
        board.revision += 1;

        let revision = board.revision;
        let state = board.requests.entry(key.to_string()).or_default();
        f(state);
        state.revision = revision;
    }
}


/// Sink for a single request on a [`LoadProgress`] board.
#[derive(Clone, Debug)]
pub struct RequestProgress {
    board: LoadProgress,
    key: String,
}

impl ProgressSink for RequestProgress {
    fn start(&self, label: &str) {
        self.board.modify(&self.key, |state| {
            state.label = Some(label.to_string());
            state.text.clear();
            state.percentage = 0.0;
            state.active = true;
        });
    }

    fn update(&self, text: &str, percentage: f32) {
        self.board.modify(&self.key, |state| {
            state.text = text.to_string();
            state.percentage = percentage;
        });
    }

    fn end(&self) {
        self.board.modify(&self.key, |state| state.active = false);
    }

    fn busy(&self, active: bool) {
        self.board.modify(&self.key, |state| state.busy = active);
    }
}


pub fn report_load_progress(
    progress: Res<LoadProgress>,
    mut last_revision: Local<u64>,
) {
    let revision = progress.revision();
    if revision == *last_revision {
        return;
    }

    for (key, state) in progress.snapshots() {
        if state.revision <= *last_revision {
            continue;
        }

        let label = state.label.as_deref().unwrap_or(key.as_str());
        if state.active {
            info!("{label}: {} ({:.0}%)", state.text, state.percentage);
        } else {
            debug!("{label}: done");
        }
    }

    *last_revision = revision;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_ends_exactly_once() {
        let recorder = ProgressRecorder::default();
        {
            let mut scope = ProgressScope::open(&recorder, "scene");
            scope.update("downloading", 10.0);
        }

        assert_eq!(
            recorder.events(),
            [
                ProgressEvent::Start("scene".to_string()),
                ProgressEvent::Update { text: "downloading".to_string(), percentage: 10.0 },
                ProgressEvent::End,
            ],
        );
    }

    #[test]
    fn scope_updates_never_decrease() {
        let recorder = ProgressRecorder::default();
        {
            let mut scope = ProgressScope::open(&recorder, "scene");
            scope.update("a", 40.0);
            scope.update("b", 20.0);
            scope.update("c", 250.0);
        }

        assert_eq!(recorder.percentages(), [40.0, 40.0, 100.0]);
    }

    #[test]
    fn busy_scope_brackets() {
        let recorder = ProgressRecorder::default();
        drop(BusyScope::open(&recorder));

        assert_eq!(recorder.events(), [ProgressEvent::Busy(true), ProgressEvent::Busy(false)]);
    }

    #[test]
    fn load_progress_tracks_latest_state() {
        let progress = LoadProgress::default();
        let sink = progress.request("scene.splat");
        sink.start("Loading scene.splat");
        sink.update("Processing", 95.0);

        let state = progress.snapshot("scene.splat").unwrap();
        assert!(state.active);
        assert_eq!(state.label.as_deref(), Some("Loading scene.splat"));
        assert_eq!(state.percentage, 95.0);
        assert_eq!(state.revision, 2);

        sink.end();
        let state = progress.snapshot("scene.splat").unwrap();
        assert!(!state.active);
        assert_eq!(state.percentage, 95.0);
    }

    #[test]
    fn interleaved_requests_keep_separate_state() {
        let progress = LoadProgress::default();
        let (a, b) = (progress.request("a.splat"), progress.request("b.ply"));

        {
            let mut scope_b = ProgressScope::open(&b, "Loading b.ply");
            {
                let mut scope_a = ProgressScope::open(&a, "Loading a.splat");
                scope_a.update("Complete", 100.0);
            }
            scope_b.update("Downloading", 60.0);

            let a_state = progress.snapshot("a.splat").unwrap();
            assert!(!a_state.active);
            assert_eq!(a_state.percentage, 100.0);

            let b_state = progress.snapshot("b.ply").unwrap();
            assert!(b_state.active);
            assert_eq!(b_state.label.as_deref(), Some("Loading b.ply"));
            assert_eq!(b_state.percentage, 60.0);
        }

        assert!(progress.snapshots().iter().all(|(_, state)| !state.active));
        assert_eq!(
            progress.snapshots().iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>(),
            ["a.splat", "b.ply"],
        );
        assert_eq!(progress.revision(), 6);
    }
}
