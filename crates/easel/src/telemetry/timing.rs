// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use tick::Clock;

/// Measures pipeline steps against a cache's clock.
pub(crate) trait StepTimer {
    /// Awaits `step`, returning its output and how long it took on this clock.
    fn time_step<F>(&self, step: F) -> impl Future<Output = (F::Output, Duration)>
    where
        F: Future;
}

impl StepTimer for Clock {
    async fn time_step<F>(&self, step: F) -> (F::Output, Duration)
    where
        F: Future,
    {
        let stopwatch = self.stopwatch();
        let output = step.await;
        (output, stopwatch.elapsed())
    }
}
