// THEORY:
// The sort engine is a pure function with no shared state, so independent jobs can run
// side by side without any locking around the core. This module supplies that
// parallelism: a pool of tokio worker tasks, each running its jobs on the blocking
// thread pool (sorting is CPU-bound and has no await points), fed by a single
// round-robin dispatcher.
//
// Typical callers: many images through one recipe, or many resolved parameter sets
// (variations) against one image. Results always come back in the order the jobs were
// submitted, no matter which worker finished first.

use crate::error::{Result, SortError};
use crate::pipeline::{PipelineConfig, SortPipeline};
use futures::future::join_all;
use image::RgbImage;
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// One unit of work: run `config` over `image` and answer on `result_sender`.
pub struct SortJob {
    pub job_id: u64,
    pub image: Arc<RgbImage>,
    pub config: PipelineConfig,
    pub result_sender: oneshot::Sender<Result<RgbImage>>,
}

/// A fixed set of worker tasks behind a round-robin dispatcher.
pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<SortJob>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers (at least one). Must be called inside a tokio runtime.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<SortJob>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..size)
            .map(|_| mpsc::unbounded_channel::<SortJob>())
            .unzip();

        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(job) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(job).is_err() {
                    warn!("worker {worker_idx} is gone, dropping job");
                }
                worker_idx = (worker_idx + 1) % size;
            }
        });

        let workers = worker_receivers
            .into_iter()
            .enumerate()
            .map(|(worker_id, mut worker_receiver)| {
                tokio::spawn(async move {
                    while let Some(job) = worker_receiver.recv().await {
                        Self::run_job(worker_id, job).await;
                    }
                })
            })
            .collect();

        Self {
            task_sender,
            dispatcher,
            workers,
        }
    }

    async fn run_job(worker_id: usize, job: SortJob) {
        let SortJob {
            job_id,
            image,
            config,
            result_sender,
        } = job;
        debug!("worker {worker_id} picked up job {job_id}");

        let outcome = tokio::task::spawn_blocking(move || SortPipeline::new(config).run(&image))
            .await
            .map_err(|e| SortError::Worker(format!("job {job_id} failed: {e}")))
            .and_then(|result| result);

        // the submitter may have stopped waiting
        let _ = result_sender.send(outcome);
    }

    /// Queues a job and waits for its result.
    pub async fn submit(
        &self,
        job_id: u64,
        image: Arc<RgbImage>,
        config: PipelineConfig,
    ) -> Result<RgbImage> {
        let (result_sender, result_receiver) = oneshot::channel();
        let job = SortJob {
            job_id,
            image,
            config,
            result_sender,
        };

        self.task_sender
            .send(job)
            .map_err(|_| SortError::Worker("failed to send job to worker pool".to_string()))?;

        result_receiver
            .await
            .map_err(|_| SortError::Worker("failed to receive result from worker".to_string()))?
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting jobs and waits for every worker to drain.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Runs sort pipelines concurrently on a `WorkerPool`.
pub struct ParallelPipeline {
    worker_pool: WorkerPool,
    job_counter: AtomicU64,
}

impl ParallelPipeline {
    /// One worker per logical CPU. Must be called inside a tokio runtime.
    pub fn new() -> Self {
        Self::with_workers(num_cpus::get())
    }

    /// Must be called inside a tokio runtime, like `WorkerPool::new`.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            worker_pool: WorkerPool::new(workers),
            job_counter: AtomicU64::new(0),
        }
    }

    pub fn workers(&self) -> usize {
        self.worker_pool.size()
    }

    fn next_job_id(&self) -> u64 {
        self.job_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Runs one pipeline over one image on the pool.
    pub async fn process(&self, image: Arc<RgbImage>, config: PipelineConfig) -> Result<RgbImage> {
        self.worker_pool.submit(self.next_job_id(), image, config).await
    }

    /// Runs every configuration against the same image. Output order matches `configs`.
    pub async fn process_variations(
        &self,
        image: Arc<RgbImage>,
        configs: Vec<PipelineConfig>,
    ) -> Result<Vec<RgbImage>> {
        let jobs = configs
            .into_iter()
            .map(|config| self.process(Arc::clone(&image), config));
        join_all(jobs).await.into_iter().collect()
    }

    /// Runs one configuration against every image. Output order matches `images`.
    pub async fn process_batch(
        &self,
        images: Vec<RgbImage>,
        config: &PipelineConfig,
    ) -> Result<Vec<RgbImage>> {
        let jobs = images
            .into_iter()
            .map(|image| self.process(Arc::new(image), config.clone()));
        join_all(jobs).await.into_iter().collect()
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}

impl Default for ParallelPipeline {
    /// Same as `ParallelPipeline::new`, so it needs a running tokio runtime too.
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Direction, MaskKind, SortKind, SortParams};
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 31 % 256) as u8, (y * 17 % 256) as u8, ((x ^ y) * 9 % 256) as u8])
        })
    }

    fn variation(threshold: i32, min_segment_len: usize) -> PipelineConfig {
        PipelineConfig::single(
            Direction::Rows,
            SortParams {
                mask_kind: MaskKind::Luminance,
                sort_kind: SortKind::Hue,
                threshold,
                min_segment_len,
                reverse: false,
            },
        )
    }

    #[tokio::test]
    async fn variations_match_sequential_runs_in_order() {
        let image = Arc::new(gradient(24, 16));
        let configs: Vec<_> = [(20, 2), (80, 3), (140, 5), (200, 8), (60, 1)]
            .into_iter()
            .map(|(t, l)| variation(t, l))
            .collect();

        let pool = ParallelPipeline::with_workers(3);
        let results = pool
            .process_variations(Arc::clone(&image), configs.clone())
            .await
            .unwrap();

        assert_eq!(results.len(), configs.len());
        for (config, result) in configs.into_iter().zip(results) {
            let expected = SortPipeline::new(config).run(&image).unwrap();
            assert_eq!(result, expected);
        }
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn batch_keeps_image_order() {
        let images: Vec<_> = (1..=4).map(|n| gradient(n * 3, n * 2)).collect();
        let config = PipelineConfig::default();
        let pool = ParallelPipeline::with_workers(2);
        let results = pool.process_batch(images.clone(), &config).await.unwrap();
        for (image, result) in images.iter().zip(&results) {
            assert_eq!(result.dimensions(), image.dimensions());
            assert_eq!(result, &SortPipeline::new(config.clone()).run(image).unwrap());
        }
        pool.shutdown().await;
    }

    #[test]
    #[should_panic]
    fn building_a_pool_outside_a_runtime_panics() {
        let _ = ParallelPipeline::with_workers(1);
    }

    #[tokio::test]
    async fn default_pool_works_inside_a_runtime() {
        let pool = ParallelPipeline::default();
        assert!(pool.workers() >= 1);
        let image = Arc::new(gradient(6, 4));
        let out = pool.process(Arc::clone(&image), variation(50, 2)).await.unwrap();
        assert_eq!(out, SortPipeline::new(variation(50, 2)).run(&image).unwrap());
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn zero_workers_still_gets_one() {
        let pool = ParallelPipeline::with_workers(0);
        assert_eq!(pool.workers(), 1);
        let out = pool
            .process(Arc::new(RgbImage::new(0, 0)), PipelineConfig::default())
            .await
            .unwrap();
        assert_eq!(out.dimensions(), (0, 0));
        pool.shutdown().await;
    }
}
