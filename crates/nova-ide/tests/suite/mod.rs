mod fixtures;
mod java_completion;
mod module_info_completion;
mod ranking;
mod select;
