use super::SchedulerProfile;

// Detected so launch can recognise an allocated node; submission is not
// implemented for SLURM.
pub static SLURM: SchedulerProfile = SchedulerProfile {
  executable: "sbatch",
  node_env_var: "SLURM_JOB_NODELIST",
  submission: None,
};
