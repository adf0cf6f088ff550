use super::{SchedulerProfile, SubmissionProfile};

pub static LSF: SchedulerProfile = SchedulerProfile {
  executable: "bsub",
  node_env_var: "LSB_HOSTS",
  submission: Some(SubmissionProfile {
    template: include_str!("templates/lsf.sh"),
    submit_command: "bsub < {job_file}",
    // bsub prints "Job <12345> is submitted to queue <normal>."
    job_id_pattern: r"Job <(\d+)>",
  }),
};
