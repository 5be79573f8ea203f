//! The story timeline: an append-only log of segments.

use std::collections::{HashMap, VecDeque};

use storyloom_core::token::JobToken;

use super::segments::{ImageSegment, StorySegment};

/// Ordered, append-only sequence of story segments.
///
/// Segments are never reordered or removed. The only in-place change is an
/// image segment moving from `Pending` to `Completed`, looked up by its job
/// token through an index rather than by scanning.
#[derive(Debug, Default)]
pub struct Timeline {
    segments: Vec<StorySegment>,
    /// Positions of still-pending image segments, oldest first, per token.
    pending: HashMap<JobToken, VecDeque<usize>>,
}

impl Timeline {
    /// Creates an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a segment to the end of the timeline.
    pub fn append(&mut self, segment: StorySegment) {
        if let StorySegment::Image(image) = &segment {
            if image.is_pending() {
                self.pending
                    .entry(image.job_token())
                    .or_default()
                    .push_back(self.segments.len());
            }
        }
        self.segments.push(segment);
    }

    /// Completes the earliest still-pending image segment carrying `token`.
    ///
    /// Returns `false` without touching any segment when no pending segment
    /// has that token, which is how stale, duplicate and unknown completion
    /// notifications are absorbed.
    pub fn resolve(&mut self, token: &JobToken, rendered_ref: &str) -> bool {
        let Some(queue) = self.pending.get_mut(token) else {
            return false;
        };
        let index = queue.pop_front();
        if queue.is_empty() {
            self.pending.remove(token);
        }
        match index.and_then(|i| self.segments.get_mut(i)) {
            Some(StorySegment::Image(image)) => image.complete(rendered_ref),
            _ => false,
        }
    }

    /// Read-only view of the segments in narrative order.
    #[must_use]
    pub fn segments(&self) -> &[StorySegment] {
        &self.segments
    }

    /// Owned copy of the segments in narrative order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StorySegment> {
        self.segments.clone()
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if no segment was ever appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of image segments still waiting for their render.
    #[must_use]
    pub fn pending_images(&self) -> usize {
        self.pending.values().map(VecDeque::len).sum()
    }

    #[cfg(test)]
    fn image_by_token(&self, token: &JobToken) -> Option<&ImageSegment> {
        self.segments
            .iter()
            .filter_map(StorySegment::as_image)
            .find(|image| image.job_token() == *token)
    }
}
