//! Result screen state: one prediction at a time, cycled on demand.

use crate::PredictionList;
use crate::error::CameraError;

/// Restarts the camera once the result screen goes away.
pub trait CameraRearm {
    fn rearm_camera(&mut self) -> Result<(), CameraError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterState {
    NotPresented,
    Showing(usize),
    Dismissed,
}

/// Text shown for the current guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionDisplay {
    pub confidence_text: String,
    pub label: String,
}

pub struct ResultPresenter {
    predictions: PredictionList,
    state: PresenterState,
}

impl ResultPresenter {
    pub fn new(predictions: PredictionList) -> Self {
        Self {
            predictions,
            state: PresenterState::NotPresented,
        }
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn predictions(&self) -> &PredictionList {
        &self.predictions
    }

    pub fn is_dismissed(&self) -> bool {
        self.state == PresenterState::Dismissed
    }

    /// Show the first guess. Only the first call has an effect.
    pub fn attach<R: CameraRearm + ?Sized>(
        &mut self,
        rearm: &mut R,
    ) -> Result<PresenterState, CameraError> {
        if self.state == PresenterState::NotPresented {
            self.show(0, rearm)?;
        }
        Ok(self.state)
    }

    /// Move to the next guess, dismissing after the last one.
    pub fn advance<R: CameraRearm + ?Sized>(
        &mut self,
        rearm: &mut R,
    ) -> Result<PresenterState, CameraError> {
        match self.state {
            PresenterState::NotPresented => self.show(0, rearm)?,
            PresenterState::Showing(i) => self.show(i + 1, rearm)?,
            PresenterState::Dismissed => {}
        }
        Ok(self.state)
    }

    pub fn dismiss<R: CameraRearm + ?Sized>(
        &mut self,
        rearm: &mut R,
    ) -> Result<PresenterState, CameraError> {
        if self.state != PresenterState::Dismissed {
            self.state = PresenterState::Dismissed;
            tracing::info!("Result dismissed; restarting camera");
            rearm.rearm_camera()?;
        }
        Ok(self.state)
    }

    pub fn current(&self) -> Option<PredictionDisplay> {
        let PresenterState::Showing(i) = self.state else {
            return None;
        };
        self.predictions.get(i).map(|p| PredictionDisplay {
            confidence_text: p.percent_text(),
            label: p.label.clone(),
        })
    }

    fn show<R: CameraRearm + ?Sized>(
        &mut self,
        index: usize,
        rearm: &mut R,
    ) -> Result<(), CameraError> {
        if index >= self.predictions.len() {
            return self.dismiss(rearm).map(|_| ());
        }
        self.state = PresenterState::Showing(index);
        tracing::debug!(index, total = self.predictions.len(), "Showing prediction");
        Ok(())
    }
}
