// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute names the change handler distinguishes.

/// Namespace of a changed attribute.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// No namespace prefix on an SVG element.
    #[default]
    Svg,
    /// `xlink:`.
    XLink,
    /// `xml:`.
    Xml,
    /// Anything else; changes in it are ignored.
    Other,
}

/// An attribute, as far as invalidation is concerned.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[expect(missing_docs, reason = "variants are named after the attributes they stand for")]
pub enum AttrName {
    Id,
    Class,
    Style,
    Transform,
    /// Transform contributed by `animateTransform`.
    AnimateTransform,
    /// Transform contributed by `animateMotion`.
    MotionTransform,
    X,
    Y,
    Width,
    Height,
    ViewBox,
    Fill,
    Stroke,
    Color,
    StopColor,
    StopOpacity,
    SolidColor,
    FloodColor,
    LightingColor,
    Opacity,
    Display,
    Visibility,
    BufferedRendering,
    AudioLevel,
    FontSize,
    FontFamily,
    FontWeight,
    FontStyle,
    LetterSpacing,
    WordSpacing,
    Href,
    /// Any attribute with no special handling.
    Other,
}

impl AttrName {
    /// Attributes that can also be set through CSS.
    #[must_use]
    pub fn is_presentation(self) -> bool {
        matches!(
            self,
            Self::Fill
                | Self::Stroke
                | Self::Color
                | Self::StopColor
                | Self::StopOpacity
                | Self::SolidColor
                | Self::FloodColor
                | Self::LightingColor
                | Self::Opacity
                | Self::Display
                | Self::Visibility
                | Self::BufferedRendering
                | Self::AudioLevel
        ) || self.affects_font_metrics()
    }

    /// Inherited into paint servers, so every element that references the
    /// subtree must be repainted.
    #[must_use]
    pub fn is_inherited_paint(self) -> bool {
        matches!(
            self,
            Self::Color | Self::StopColor | Self::SolidColor | Self::StopOpacity
        )
    }

    /// Attributes font-relative lengths depend on.
    #[must_use]
    pub fn affects_font_metrics(self) -> bool {
        matches!(
            self,
            Self::FontSize
                | Self::FontFamily
                | Self::FontWeight
                | Self::FontStyle
                | Self::LetterSpacing
                | Self::WordSpacing
        )
    }

    /// `transform` and the animated contributions to it.
    #[must_use]
    pub fn is_transform(self) -> bool {
        matches!(
            self,
            Self::Transform | Self::AnimateTransform | Self::MotionTransform
        )
    }

    /// Viewport geometry on viewport-establishing elements.
    #[must_use]
    pub fn is_viewport_geometry(self) -> bool {
        matches!(self, Self::Width | Self::Height | Self::ViewBox)
    }
}
