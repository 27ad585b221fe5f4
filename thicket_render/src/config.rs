// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer policy and tuning knobs.

use thicket_region::RegionConfig;

/// How [`Renderer::update`](crate::Renderer::update) drives the work list.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RenderPolicy {
    /// Paint every sub-area before returning.
    #[default]
    Sync,
    /// Let the painter time out and continue from the event loop.
    Async,
}

/// Renderer options.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RendererConfig {
    /// Driving policy.
    pub policy: RenderPolicy,
    /// With [`RenderPolicy::Async`], yield after this many sub-areas even if
    /// the painter never timed out. `None` means no limit.
    pub max_sub_areas_per_update: Option<usize>,
    /// Report partial results to the listener when yielding.
    pub allow_partial: bool,
    /// Coalescing of the invalid region into sub-areas.
    pub region: RegionConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            policy: RenderPolicy::Sync,
            max_sub_areas_per_update: None,
            allow_partial: true,
            region: RegionConfig::default(),
        }
    }
}

impl RendererConfig {
    /// Sets the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RenderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the per-update sub-area limit.
    #[must_use]
    pub fn with_max_sub_areas_per_update(mut self, max: Option<usize>) -> Self {
        self.max_sub_areas_per_update = max;
        self
    }

    /// Enables or disables partial-result notifications.
    #[must_use]
    pub fn with_allow_partial(mut self, allow_partial: bool) -> Self {
        self.allow_partial = allow_partial;
        self
    }

    /// Sets the coalescing parameters.
    #[must_use]
    pub fn with_region(mut self, region: RegionConfig) -> Self {
        self.region = region;
        self
    }
}
