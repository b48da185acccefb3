//! Maps viewport intersection samples to an active section.
//!
//! Every section carries a visibility threshold. A section joins the visible
//! set once its ratio reaches the threshold and leaves once it drops below
//! `threshold - exit_dead_band`. Among visible sections the one with the
//! largest ratio is active; ties go to the lowest `order_index`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::TourError;
use crate::publisher::{SectionPublisher, SectionSnapshot};

pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.3;

fn default_visibility_threshold() -> f64 {
    DEFAULT_VISIBILITY_THRESHOLD
}

/// A content section the page registers with the mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    pub id: String,
    pub order_index: usize,
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,
}

impl SectionDescriptor {
    pub fn new(id: impl Into<String>, order_index: usize) -> Self {
        Self {
            id: id.into(),
            order_index,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, visibility_threshold: f64) -> Self {
        self.visibility_threshold = visibility_threshold;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MapperOptions {
    /// Extra drop below the threshold before a visible section leaves.
    /// `0.0` means a single threshold for both directions.
    pub exit_dead_band: f64,
}

/// One observer reading for one section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionSample {
    /// Fraction of the section inside the viewport. Authoritative when set.
    pub ratio: Option<f64>,
    pub is_intersecting: bool,
}

impl IntersectionSample {
    pub fn ratio(ratio: f64) -> Self {
        Self {
            ratio: Some(ratio),
            is_intersecting: ratio > 0.0,
        }
    }

    /// A reading that only reports whether the section intersects.
    pub fn intersecting(is_intersecting: bool) -> Self {
        Self {
            ratio: None,
            is_intersecting,
        }
    }

    fn resolve(self, id: &str) -> Result<f64, TourError> {
        match self.ratio {
            Some(ratio) if ratio.is_nan() => Err(TourError::NonFiniteRatio(id.to_string())),
            Some(ratio) => Ok(ratio.clamp(0.0, 1.0)),
            None if self.is_intersecting => Ok(1.0),
            None => Ok(0.0),
        }
    }
}

/// Emitted when the active section changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionChange {
    pub previous: Option<String>,
    pub current: Option<String>,
}

/// Tracks section visibility and the active section.
#[derive(Debug)]
pub struct ScrollMapper {
    sections: BTreeMap<String, SectionDescriptor>,
    options: MapperOptions,
    visible: BTreeSet<String>,
    active: Option<String>,
    progress: BTreeMap<String, f64>,
    publisher: SectionPublisher,
}

impl ScrollMapper {
    pub fn new(
        descriptors: Vec<SectionDescriptor>,
        options: MapperOptions,
    ) -> Result<Self, TourError> {
        let band = options.exit_dead_band;
        if !(0.0..1.0).contains(&band) {
            return Err(TourError::InvalidOption {
                name: "exit_dead_band",
                reason: "must be in [0, 1)",
            });
        }

        let mut sections = BTreeMap::new();
        let mut orders = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let threshold = descriptor.visibility_threshold;
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(TourError::InvalidThreshold {
                    id: descriptor.id,
                    threshold,
                });
            }
            // Otherwise the exit bound is at or below zero and the section
            // could never leave the visible set.
            if threshold <= band {
                return Err(TourError::DeadBandExceedsThreshold {
                    id: descriptor.id,
                    threshold,
                    exit_dead_band: band,
                });
            }
            if sections.contains_key(&descriptor.id) {
                return Err(TourError::DuplicateSection(descriptor.id));
            }
            orders.push(descriptor.order_index);
            sections.insert(descriptor.id.clone(), descriptor);
        }

        orders.sort_unstable();
        if let Some(missing) = orders
            .iter()
            .enumerate()
            .find_map(|(expected, &order)| (order != expected).then_some(expected))
        {
            return Err(TourError::SectionOrderGap(missing));
        }

        let progress = sections.keys().map(|id| (id.clone(), 0.0)).collect();
        tracing::debug!(sections = sections.len(), exit_dead_band = band, "scroll mapper ready");
        Ok(Self {
            sections,
            options,
            visible: BTreeSet::new(),
            active: None,
            progress,
            publisher: SectionPublisher::new(),
        })
    }

    /// Applies one sample, publishes a snapshot, and reports an active
    /// section change if there was one.
    pub fn observe(
        &mut self,
        id: &str,
        sample: IntersectionSample,
    ) -> Result<Option<SectionChange>, TourError> {
        self.observe_batch([(id, sample)])
    }

    /// Applies every sample of one observer callback, then publishes once.
    ///
    /// The batch is validated up front; on error no sample is applied.
    pub fn observe_batch<I, S>(&mut self, samples: I) -> Result<Option<SectionChange>, TourError>
    where
        I: IntoIterator<Item = (S, IntersectionSample)>,
        S: AsRef<str>,
    {
        let mut resolved = Vec::new();
        for (id, sample) in samples {
            let id = id.as_ref();
            let Some(descriptor) = self.sections.get(id) else {
                return Err(TourError::UnknownSection(id.to_string()));
            };
            resolved.push((descriptor, sample.resolve(id)?));
        }
        if resolved.is_empty() {
            return Ok(None);
        }

        for (descriptor, ratio) in resolved {
            let id = &descriptor.id;
            self.progress.insert(id.clone(), ratio);
            let threshold = descriptor.visibility_threshold;
            if ratio >= threshold {
                self.visible.insert(id.clone());
            } else if ratio < threshold - self.options.exit_dead_band {
                self.visible.remove(id);
            }
        }

        let change = self.recompute_active();
        self.publisher.publish(self.snapshot());
        Ok(change)
    }

    #[allow(clippy::float_cmp)]
    fn recompute_active(&mut self) -> Option<SectionChange> {
        let mut best: Option<(&SectionDescriptor, f64)> = None;
        for id in &self.visible {
            let descriptor = &self.sections[id];
            let ratio = self.progress.get(id).copied().unwrap_or(0.0);
            let better = match best {
                None => true,
                Some((current, current_ratio)) => {
                    ratio > current_ratio
                        || (ratio == current_ratio && descriptor.order_index < current.order_index)
                }
            };
            if better {
                best = Some((descriptor, ratio));
            }
        }

        let next = best.map(|(descriptor, _)| descriptor.id.clone());
        if next == self.active {
            return None;
        }
        tracing::debug!(
            previous = ?self.active,
            current = ?next,
            "active section changed"
        );
        let previous = std::mem::replace(&mut self.active, next.clone());
        Some(SectionChange {
            previous,
            current: next,
        })
    }

    pub fn active_section(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Visible section ids in page order.
    pub fn visible_sections(&self) -> Vec<&str> {
        let mut visible: Vec<&SectionDescriptor> =
            self.visible.iter().map(|id| &self.sections[id]).collect();
        visible.sort_by_key(|descriptor| descriptor.order_index);
        visible.into_iter().map(|d| d.id.as_str()).collect()
    }

    /// Latest ratio for `id`, or `None` for an unregistered section.
    pub fn progress(&self, id: &str) -> Option<f64> {
        self.progress.get(id).copied()
    }

    pub fn section(&self, id: &str) -> Option<&SectionDescriptor> {
        self.sections.get(id)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn snapshot(&self) -> SectionSnapshot {
        SectionSnapshot {
            active: self.active.clone(),
            progress: self.progress.clone(),
        }
    }

    pub fn publisher(&self) -> &SectionPublisher {
        &self.publisher
    }
}
