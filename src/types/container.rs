use k8s_openapi::api::core::v1 as k8s;

#[derive(Clone, Debug)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub ports: Vec<i32>,
    pub env: Vec<(String, String)>,
    pub volume_mounts: Vec<VolumeMount>,
}

impl Container {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            command: Vec::new(),
            ports: Vec::new(),
            env: Vec::new(),
            volume_mounts: Vec::new(),
        }
    }

    pub fn command(mut self, cmd: Vec<impl Into<String>>) -> Self {
        self.command = cmd.into_iter().map(Into::into).collect();
        self
    }

    pub fn port(mut self, port: i32) -> Self {
        self.ports.push(port);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn volume_mount(mut self, name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        self.volume_mounts.push(VolumeMount {
            name: name.into(),
            mount_path: mount_path.into(),
        });
        self
    }

    pub fn into_k8s(self) -> k8s::Container {
        k8s::Container {
            name: self.name,
            image: Some(self.image),
            command: if self.command.is_empty() {
                None
            } else {
                Some(self.command)
            },
            ports: if self.ports.is_empty() {
                None
            } else {
                Some(
                    self.ports
                        .into_iter()
                        .map(|container_port| k8s::ContainerPort {
                            container_port,
                            ..Default::default()
                        })
                        .collect(),
                )
            },
            env: if self.env.is_empty() {
                None
            } else {
                Some(
                    self.env
                        .into_iter()
                        .map(|(name, value)| k8s::EnvVar {
                            name,
                            value: Some(value),
                            value_from: None,
                        })
                        .collect(),
                )
            },
            volume_mounts: if self.volume_mounts.is_empty() {
                None
            } else {
                Some(
                    self.volume_mounts
                        .into_iter()
                        .map(|v| v.into_k8s())
                        .collect(),
                )
            },
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
}

impl VolumeMount {
    pub fn into_k8s(self) -> k8s::VolumeMount {
        k8s::VolumeMount {
            name: self.name,
            mount_path: self.mount_path,
            ..Default::default()
        }
    }
}
