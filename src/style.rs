//! Terminal styling utilities
//!
//! A small semantic palette for CLI output:
//! - Cyan for headers and technical terms (names, patterns)
//! - Green/yellow/red for status
//! - Dim for secondary information

use crossterm::style::Stylize;

/// Extension trait for consistent pacycle styling
///
/// Extends crossterm's `Stylize` with semantic styling methods. Use these
/// instead of direct color calls so the listing and outcome lines share one
/// visual language.
pub trait PacycleStyle: Stylize {
    /// Style for section headers (cyan bold)
    fn header(self) -> <<Self as Stylize>::Styled as Stylize>::Styled
    where
        Self: Sized,
        <Self as Stylize>::Styled: Stylize,
    {
        self.cyan().bold()
    }

    /// Style for success/active status (green)
    fn success(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.green()
    }

    /// Style for warnings and partial states (yellow)
    fn warning(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.yellow()
    }

    /// Style for technical identifiers: sink names, profile names, patterns (cyan)
    fn technical(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.cyan()
    }

    /// Style for secondary information (dim)
    fn subtle(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.dim()
    }
}

impl<T: Stylize> PacycleStyle for T {}
