use rdkafka::topic_partition_list::TopicPartitionListElem;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition {
    topic: String,
    partition_number: i32,
}

impl Partition {
    pub fn new(topic: String, partition_number: i32) -> Self {
        Self {
            topic,
            partition_number,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition_number(&self) -> i32 {
        self.partition_number
    }
}

impl From<TopicPartitionListElem<'_>> for Partition {
    fn from(elem: TopicPartitionListElem<'_>) -> Self {
        Self::new(elem.topic().to_string(), elem.partition())
    }
}

/// One entry of a proposed partition assignment, handed to assignment
/// listeners for inspection and mutation.
///
/// `resume_offset` is `None` until a listener pins it; `None` means the
/// source's default resume policy (committed offset or offset reset) applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionAssignment {
    partition: Partition,
    resume_offset: Option<i64>,
}

impl PartitionAssignment {
    pub fn new(partition: Partition, resume_offset: Option<i64>) -> Self {
        Self {
            partition,
            resume_offset,
        }
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn topic(&self) -> &str {
        self.partition.topic()
    }

    pub fn partition_number(&self) -> i32 {
        self.partition.partition_number()
    }

    pub fn resume_offset(&self) -> Option<i64> {
        self.resume_offset
    }

    pub fn set_resume_offset(&mut self, offset: i64) {
        self.resume_offset = Some(offset);
    }
}
