/// On/off visibility of the loading indicator. The UI draws a spinner while
/// this reports visible.
#[derive(Debug, Default)]
pub struct LoadingIndicator {
    visible: bool,
}

impl LoadingIndicator {
    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Scoped show/hide pair: shows the indicator on acquisition and hides it
/// when dropped, so every exit path of an operation hides it, including
/// early returns on failure.
pub struct IndicatorGuard<'a> {
    indicator: &'a mut LoadingIndicator,
}

impl<'a> IndicatorGuard<'a> {
    pub fn acquire(indicator: &'a mut LoadingIndicator) -> Self {
        indicator.show();
        Self { indicator }
    }
}

impl Drop for IndicatorGuard<'_> {
    fn drop(&mut self) {
        self.indicator.hide();
    }
}
