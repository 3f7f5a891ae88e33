//! Face detections: purge stale rows, fan out to every user that can see the
//! file, then request clustering once per affected user.

use crate::error::RowError;
use crate::jobs::{JobKind, JobScheduler};
use crate::models::{decode_faces, FaceDetection, ModelKind};
use crate::ownership::OwnershipResolver;
use crate::report::BatchReport;
use crate::settings::ModelStatus;
use crate::store::FaceStore;
use providers::{FileDescriptor, RawResult};
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

/// Faces scoring below this are discarded.
pub const MIN_FACE_SCORE: f32 = 0.8;

pub struct FaceHandler<'a> {
    model: ModelKind,
    faces: &'a dyn FaceStore,
    owners: &'a dyn OwnershipResolver,
    jobs: &'a dyn JobScheduler,
    status: &'a ModelStatus,
    users_to_cluster: BTreeSet<String>,
}

impl<'a> FaceHandler<'a> {
    pub fn new(
        model: ModelKind,
        faces: &'a dyn FaceStore,
        owners: &'a dyn OwnershipResolver,
        jobs: &'a dyn JobScheduler,
        status: &'a ModelStatus,
    ) -> Self {
        Self {
            model,
            faces,
            owners,
            jobs,
            status,
            users_to_cluster: BTreeSet::new(),
        }
    }

    /// Never fails; every row-level problem ends up in `report`.
    pub async fn handle(&mut self, file: &FileDescriptor, raw: &RawResult, report: &mut BatchReport) {
        // Must finish before any insert for this file, and runs even when the
        // new result is unusable.
        self.remove_existing(file, report).await;

        let detected = match decode_faces(raw) {
            Ok(faces) => faces,
            Err(source) => {
                error!(file_id = file.file_id, error = %source, "could not decode face result");
                report.record(RowError::Decode {
                    file_id: file.file_id,
                    model: self.model.name(),
                    source,
                });
                return;
            }
        };

        let kept: Vec<_> = detected
            .into_iter()
            .filter(|face| face.score >= MIN_FACE_SCORE)
            .collect();
        if kept.is_empty() {
            return;
        }

        let users = match self.owners.users_for_root(file.root_id).await {
            Ok(users) => users,
            Err(source) => {
                error!(file_id = file.file_id, root_id = file.root_id, error = %source, "could not resolve users of file");
                report.record(RowError::Ownership {
                    file_id: file.file_id,
                    root_id: file.root_id,
                    source,
                });
                return;
            }
        };
        if users.is_empty() {
            debug!(file_id = file.file_id, root_id = file.root_id, "no user can access file");
            return;
        }

        let mut stored = false;
        for face in &kept {
            for user_id in &users {
                let detection = FaceDetection {
                    user_id: user_id.clone(),
                    file_id: file.file_id,
                    bbox: face.bbox(),
                    vector: face.vector.clone(),
                };
                match self.faces.insert(&detection).await {
                    Ok(_) => {
                        stored = true;
                        report.detections_inserted += 1;
                        self.users_to_cluster.insert(user_id.clone());
                    }
                    Err(source) => {
                        error!(file_id = file.file_id, user_id = %user_id, error = %source, "could not store face detection");
                        report.record(RowError::Insert {
                            file_id: file.file_id,
                            user_id: user_id.clone(),
                            source,
                        });
                    }
                }
            }
        }

        if stored {
            if let Err(source) = self.status.mark_ready(self.model.name()).await {
                error!(model = self.model.name(), error = %source, "could not set model status");
                report.record(RowError::Status {
                    model: self.model.name(),
                    source,
                });
            }
        }
    }

    async fn remove_existing(&self, file: &FileDescriptor, report: &mut BatchReport) {
        let existing = match self.faces.find_by_file_id(file.file_id).await {
            Ok(rows) => rows,
            Err(source) => {
                // Proceed as if the file had no detections.
                error!(file_id = file.file_id, error = %source, "could not query existing face detections");
                report.record(RowError::Lookup {
                    file_id: file.file_id,
                    source,
                });
                return;
            }
        };
        for detection in &existing {
            match self.faces.delete(detection).await {
                Ok(()) => report.detections_deleted += 1,
                Err(source) => {
                    warn!(file_id = file.file_id, detection_id = detection.id, error = %source, "could not delete existing face detection");
                    report.record(RowError::Delete {
                        file_id: file.file_id,
                        detection_id: detection.id,
                        source,
                    });
                }
            }
        }
    }

    /// Requests clustering for each affected user that has no pending job.
    pub async fn finish(self, report: &mut BatchReport) {
        for user_id in self.users_to_cluster {
            match self.jobs.exists(JobKind::ClusterFaces, &user_id).await {
                Ok(true) => debug!(user_id = %user_id, "clustering already pending"),
                Ok(false) => match self.jobs.enqueue(JobKind::ClusterFaces, &user_id).await {
                    Ok(()) => {
                        info!(user_id = %user_id, "clustering job enqueued");
                        report.jobs_enqueued.push(user_id.clone());
                    }
                    Err(source) => {
                        error!(user_id = %user_id, error = %source, "could not enqueue clustering job");
                        report.record(RowError::Schedule {
                            user_id: user_id.clone(),
                            source,
                        });
                    }
                },
                Err(source) => {
                    error!(user_id = %user_id, error = %source, "could not look up clustering job");
                    report.record(RowError::Schedule {
                        user_id: user_id.clone(),
                        source,
                    });
                }
            }
            report.users_to_cluster.push(user_id);
        }
    }
}
