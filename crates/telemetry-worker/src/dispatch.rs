//! Request dispatch.
//!
//! The dispatcher decodes an envelope into a [`Request`], runs the matching
//! component to completion and wraps the outcome with the request's
//! correlation id. Every failure becomes an error response; nothing is
//! propagated to the host.

use tracing::{debug, warn};

use telemetry_core::{values_of, with_values, Error, Result};
use telemetry_dsp::{
    analyze, apply_window, decimate, moving_average, spectrum, FilterCarry, FilterKind,
    KalmanFilter,
};

use crate::config::{FilterDefaults, LimitsConfig, WorkerConfig};
use crate::message::{
    AnalysisResult, AnalyzePayload, FilterOutput, FilterPayload, InboundMessage, Outcome, Request,
    Response, ResponseBody,
};

/// Routes requests to the DSP components
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    filters: FilterDefaults,
    limits: LimitsConfig,
}

impl Dispatcher {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            filters: config.filters.clone(),
            limits: config.limits.clone(),
        }
    }

    /// Handle one envelope; always yields exactly one response
    pub fn handle(&self, message: InboundMessage) -> Response {
        let InboundMessage { kind, data, id } = message;

        let outcome = match Request::decode(&kind, data).and_then(|request| {
            debug!(id = %id, kind = %kind, points = request.points().len(), "dispatching request");
            self.execute(request)
        }) {
            Ok(body) => Outcome::Result(body),
            Err(e) => {
                warn!(id = %id, kind = %kind, error = %e, "request failed");
                Outcome::Error(e.to_string())
            }
        };

        Response { kind, outcome, id }
    }

    /// Decode, handle and encode a JSON envelope
    pub fn handle_json(&self, text: &str) -> Result<String> {
        let message = InboundMessage::from_json(text)?;
        let response = self.handle(message);
        Ok(serde_json::to_string(&response)?)
    }

    /// Run a decoded request
    pub fn execute(&self, request: Request) -> Result<ResponseBody> {
        match request {
            Request::Decimate(p) => Ok(ResponseBody::Decimate(decimate(&p.points, p.threshold))),
            Request::Analyze(p) => self.analyze(p).map(ResponseBody::Analyze),
            Request::Filter(p) => self.filter(p).map(ResponseBody::Filter),
        }
    }

    fn analyze(&self, payload: AnalyzePayload) -> Result<AnalysisResult> {
        let values = values_of(&payload.points);

        let fft = if payload.include_fft {
            if let Some(max) = self.limits.max_spectrum_len {
                if values.len() > max {
                    return Err(Error::InvalidInput(format!(
                        "{} points exceed the spectrum limit of {max}",
                        values.len()
                    )));
                }
            }
            Some(spectrum(&apply_window(&values, payload.window)))
        } else {
            None
        };

        Ok(AnalysisResult {
            statistics: analyze(&values),
            fft,
        })
    }

    fn filter(&self, payload: FilterPayload) -> Result<FilterOutput> {
        let values = values_of(&payload.points);

        if let Some(mut handle) = payload.handle {
            if handle.kind() != payload.filter_type {
                return Err(Error::MalformedPayload(format!(
                    "filterType '{}' does not match handle {} of kind '{}'",
                    payload.filter_type,
                    handle.id,
                    handle.kind()
                )));
            }
            if let FilterCarry::Kalman(state) = &handle.carry {
                check_noise(state.process_noise, state.measurement_noise)?;
                if !state.error_covariance.is_finite() || state.error_covariance < 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "handle {} carries an invalid error covariance ({})",
                        handle.id, state.error_covariance
                    )));
                }
            }

            let filtered = handle.apply(&values);
            return Ok(FilterOutput::Continued {
                points: with_values(&payload.points, &filtered),
                handle,
            });
        }

        let filtered = match payload.filter_type {
            FilterKind::MovingAverage => {
                let window_size = payload.window_size.unwrap_or(self.filters.window_size);
                moving_average(&values, window_size)
            }
            FilterKind::Kalman => {
                let q = payload.process_noise.unwrap_or(self.filters.process_noise);
                let r = payload.measurement_noise.unwrap_or(self.filters.measurement_noise);
                check_noise(q, r)?;
                KalmanFilter::new(q, r).filter_signal(&values)
            }
        };

        Ok(FilterOutput::Series(with_values(&payload.points, &filtered)))
    }
}

fn check_noise(q: f64, r: f64) -> Result<()> {
    if q < 0.0 || r < 0.0 {
        return Err(Error::InvalidInput(format!(
            "noise variances must be non-negative (Q = {q}, R = {r})"
        )));
    }
    Ok(())
}
