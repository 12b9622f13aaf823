/// Business rules spanning several models
///
/// - [`shift`]: beginner detection, attendance window, booking and
///   generation of shifts from the weekly template

pub mod shift;
