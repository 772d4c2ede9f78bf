use std::collections::HashMap;

use crate::tween::{GroupId, Tween, TweenManager};

/// Where a timeline entry starts.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    Start,
    /// After everything added so far.
    End,
    At(f32),
    Label(String),
    /// Together with the previously added entry.
    WithPrevious,
    /// Relative to the current end; negative values overlap.
    Offset(f32),
}

/// Sequences tweens on a shared clock. Entries are compiled into delayed
/// tweens of one group when the timeline is played.
pub struct Timeline<C> {
    entries: Vec<Tween<C>>,
    labels: HashMap<String, f32>,
    end: f32,
    previous_start: f32,
}

impl<C> Default for Timeline<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            labels: HashMap::new(),
            end: 0.0,
            previous_start: 0.0,
        }
    }
}

impl<C: Clone> Timeline<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tween: Tween<C>) -> &mut Self {
        self.add_at(tween, Position::End)
    }

    pub fn add_at(&mut self, tween: Tween<C>, position: Position) -> &mut Self {
        let start = self.resolve(&position);
        self.push(tween, start);
        self
    }

    /// Marks the current end (or an explicit position) with `name`.
    pub fn label(&mut self, name: &str, position: Position) -> &mut Self {
        let at = self.resolve(&position);
        self.labels.insert(name.to_owned(), at);
        self
    }

    /// Starts each tween `each` seconds after the previous one.
    pub fn stagger(
        &mut self,
        tweens: impl IntoIterator<Item = Tween<C>>,
        each: f32,
        position: Position,
    ) -> &mut Self {
        let base = self.resolve(&position);
        for (i, tween) in tweens.into_iter().enumerate() {
            self.push(tween, base + i as f32 * each);
        }
        self.previous_start = base;
        self
    }

    pub fn call(&mut self, cue: C, position: Position) -> &mut Self {
        self.add_at(Tween::call(cue), position)
    }

    pub fn duration(&self) -> f32 {
        self.end
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn label_time(&self, name: &str) -> Option<f32> {
        self.labels.get(name).copied()
    }

    pub fn play(self, manager: &mut TweenManager<C>) -> GroupId {
        let group = manager.new_group();
        for tween in self.entries {
            manager.add_grouped(tween, group);
        }
        group
    }

    fn resolve(&self, position: &Position) -> f32 {
        match position {
            Position::Start => 0.0,
            Position::End => self.end,
            Position::At(secs) => secs.max(0.0),
            Position::Label(name) => match self.labels.get(name) {
                Some(at) => *at,
                None => {
                    log::warn!("Timeline label `{}` is unknown, appending instead.", name);
                    self.end
                }
            },
            Position::WithPrevious => self.previous_start,
            Position::Offset(secs) => (self.end + secs).max(0.0),
        }
    }

    fn push(&mut self, tween: Tween<C>, start: f32) {
        let tween = tween.shifted(start);
        self.end = self.end.max(tween.span());
        self.previous_start = start;
        self.entries.push(tween);
    }
}
