use crate::config::Config;
use crate::generator::crew::CrewInputs;
use crate::notify::UpdateSender;

#[derive(Clone)]
pub struct GeneratorContext {
    /// 配置
    pub config: Config,
    /// 状态消息的生产端
    pub updates: UpdateSender,
}

impl GeneratorContext {
    /// 创建新的生成器上下文
    pub fn new(config: Config, updates: UpdateSender) -> Self {
        Self { config, updates }
    }

    /// 流水线的输入变量
    pub fn input_variables(&self) -> CrewInputs {
        CrewInputs::new(self.config.inputs.to_variables())
    }
}
