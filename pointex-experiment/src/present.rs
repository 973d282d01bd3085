use pointex_core::{Placement, Point, StimulusId};

/// Drawing and audio seam. Implementations own styling, fonts and tones;
/// the trial only issues declarative requests.
pub trait Presenter {
    fn clear(&mut self);
    fn show(&mut self, stimulus: &StimulusId, at: Point);
    fn message(&mut self, text: &str, at: Point);
    fn flip(&mut self);
    /// Go cue.
    fn tone(&mut self);
}

/// Presenter that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn clear(&mut self) {}
    fn show(&mut self, _stimulus: &StimulusId, _at: Point) {}
    fn message(&mut self, _text: &str, _at: Point) {}
    fn flip(&mut self) {}
    fn tone(&mut self) {}
}

/// Stimuli currently on screen. Each change redraws the whole frame.
#[derive(Debug, Default, Clone)]
pub(crate) struct Scene {
    items: Vec<Placement>,
}

impl Scene {
    pub fn contains(&self, stimulus: &StimulusId) -> bool {
        self.items.iter().any(|p| &p.stimulus == stimulus)
    }

    pub fn add(&mut self, stimulus: StimulusId, at: Point) {
        if !self.contains(&stimulus) {
            self.items.push(Placement { stimulus, at });
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn draw<P: Presenter>(&self, presenter: &mut P) {
        presenter.clear();
        for item in &self.items {
            presenter.show(&item.stimulus, item.at);
        }
        presenter.flip();
    }
}
