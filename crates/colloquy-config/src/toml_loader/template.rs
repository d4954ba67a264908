//! Default TOML config template with inline documentation comments.

pub(crate) fn default_config_toml() -> String {
    r##"# Colloquy Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[model]
# name = "echo"
# context_size = 2048        # 16-1048576

[generation]
# max_new_tokens = 1024      # >= 1
# temperature = 0.8          # 0.0-2.0
# top_p = 0.9                # 0.0-1.0
# top_k = 40                 # 0-1000
# thinking = false           # false appends /no_think to the system turn
# grammar = 'root ::= ("si" | "no")'   # GBNF; unset: unconstrained

[prompt]
# end_of_turn = "<|im_end|>"
# leading = "<s>"            # unset: no beginning-of-sequence token
# system_header = "<|im_start|>system"
# user_header = "<|im_start|>user"
# assistant_header = "<|im_start|>assistant"
# think_open = "<think>"
# think_close = "</think>"
# system_prompt = ""

[display]
# user_name = "utente"
# assistant_name = "assistant"
# hide_empty_thinking = true

[logging]
# level = "info"             # trace, debug, info, warn, error
# debug = false
"##
    .to_string()
}
